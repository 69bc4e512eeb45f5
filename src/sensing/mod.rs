pub mod buffer;
pub mod context;
pub mod controller;
pub mod loop_worker;
pub mod recorder;

pub use buffer::EventBuffer;
pub use context::{resolve_or_empty, ContextResolver, LookupTarget, NullResolver};
pub use controller::SegmentationController;
pub use recorder::InputRecorder;
