use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::RawEvent;

/// Shared append-only event buffer between the input listeners and the
/// segmentation host.
///
/// Listeners only ever `push`; the host only ever `drain`s, which swaps the
/// contents out under the lock so no event is seen twice or lost.
#[derive(Clone, Default)]
pub struct EventBuffer {
    inner: Arc<Mutex<Vec<RawEvent>>>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: RawEvent) {
        self.lock().push(event);
    }

    /// Atomically empty the buffer and return what it held, in append order.
    pub fn drain(&self) -> Vec<RawEvent> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A listener that panicked mid-push leaves a complete Vec behind, so the
    // data is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<RawEvent>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
