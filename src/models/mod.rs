pub mod event;
pub mod interaction;

pub use event::{Context, Key, MouseButton, RawEvent, RawEventKind};
pub use interaction::{Interaction, InteractionKind};
