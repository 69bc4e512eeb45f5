//! Turns a captured stream of low-level input events into clicks, double
//! clicks, drags, scrolls, key presses, held keys and typing runs.

pub mod models;
pub mod narrative;
pub mod segmentation;
pub mod sensing;
pub mod settings;
mod utils;

pub use models::{Context, Interaction, InteractionKind, Key, MouseButton, RawEvent, RawEventKind};
pub use segmentation::{segment_batch, BatchOutcome, SegmentationConfig, SessionSegmenter};
pub use sensing::{ContextResolver, EventBuffer, InputRecorder, SegmentationController};
pub use settings::{Settings, SettingsStore};

/// Initialize logging (reads RUST_LOG env var). Call once from the binary.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
