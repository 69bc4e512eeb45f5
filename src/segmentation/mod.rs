pub mod algorithm;
pub mod clicks;
pub mod config;
pub mod keys;
pub mod scroll;

pub use algorithm::{segment_batch, BatchOutcome, SessionSegmenter};
pub use config::SegmentationConfig;
