//! Listener-facing side of capture.
//!
//! Platform input hooks call into an `InputRecorder` from whatever thread
//! delivers their notifications. Each call stamps the event, resolves its
//! context once and appends it to the shared buffer.

use std::sync::Arc;

use chrono::Utc;

use crate::models::{Key, MouseButton, RawEvent, RawEventKind};

use super::buffer::EventBuffer;
use super::context::{resolve_or_empty, ContextResolver, LookupTarget};

/// Wall-clock seconds since the Unix epoch, microsecond precision.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[derive(Clone)]
pub struct InputRecorder {
    buffer: EventBuffer,
    resolver: Arc<dyn ContextResolver>,
}

impl InputRecorder {
    pub fn new(buffer: EventBuffer, resolver: Arc<dyn ContextResolver>) -> Self {
        Self { buffer, resolver }
    }

    pub fn buffer(&self) -> &EventBuffer {
        &self.buffer
    }

    /// Pointer listener callback for a button going down or up.
    pub fn pointer_button(&self, button: MouseButton, pressed: bool, x: u32, y: u32) {
        let kind = if pressed {
            RawEventKind::PointerPress { button, x, y }
        } else {
            RawEventKind::PointerRelease { button, x, y }
        };
        self.record(kind, LookupTarget::Point { x, y });
    }

    /// Pointer listener callback for one scroll tick.
    pub fn scroll(&self, x: u32, y: u32, dx: i32, dy: i32) {
        self.record(
            RawEventKind::Scroll { x, y, dx, dy },
            LookupTarget::Point { x, y },
        );
    }

    /// Keyboard listener callback. Key events target the focused element.
    pub fn key(&self, key: Key, pressed: bool) {
        let kind = if pressed {
            RawEventKind::KeyPress { key }
        } else {
            RawEventKind::KeyRelease { key }
        };
        self.record(kind, LookupTarget::Focused);
    }

    fn record(&self, kind: RawEventKind, target: LookupTarget) {
        let timestamp = now_secs();
        let context = resolve_or_empty(self.resolver.as_ref(), target);
        self.buffer.push(RawEvent {
            timestamp,
            context,
            kind,
        });
    }
}
