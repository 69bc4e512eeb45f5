//! Raw input event data model.
//!
//! A `RawEvent` is one elementary recorded occurrence (button press/release,
//! scroll tick, key press/release) stamped with the time it happened and the
//! UI context that was resolved when it was captured.

use std::hash::{Hash, Hasher};

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// What the event targeted on screen. Any field may be missing when the
/// platform lookup failed or the element exposed nothing useful.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Context {
    pub control_name: Option<String>,
    pub control_class: Option<String>,
    pub window_title: Option<String>,
    pub process_name: Option<String>,
}

impl Context {
    pub fn is_empty(&self) -> bool {
        self.control_name.is_none()
            && self.control_class.is_none()
            && self.window_title.is_none()
            && self.process_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    Primary,
    Secondary,
    Middle,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            MouseButton::Primary => "primary",
            MouseButton::Secondary => "secondary",
            MouseButton::Middle => "middle",
        }
    }
}

/// Keyboard key. Identity is the `name`; printable keys also carry the
/// character they produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Key {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char: Option<char>,
}

impl Key {
    pub fn printable(c: char) -> Self {
        Self {
            name: c.to_string(),
            char: Some(c),
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            char: None,
        }
    }

    /// Human readable label: the character for printable keys, the name otherwise.
    pub fn label(&self) -> String {
        match self.char {
            Some(c) => c.to_string(),
            None => self.name.clone(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RawEventKind {
    PointerPress { button: MouseButton, x: u32, y: u32 },
    PointerRelease { button: MouseButton, x: u32, y: u32 },
    Scroll { x: u32, y: u32, dx: i32, dy: i32 },
    KeyPress { key: Key },
    KeyRelease { key: Key },
}

/// One captured input occurrence. `timestamp` is seconds as a real number and
/// never decreases within a single producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: f64,
    #[serde(default)]
    pub context: Context,
    #[serde(flatten)]
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn new(timestamp: f64, kind: RawEventKind) -> Self {
        Self {
            timestamp,
            context: Context::default(),
            kind,
        }
    }

    pub fn pointer_press(timestamp: f64, button: MouseButton, x: u32, y: u32) -> Self {
        Self::new(timestamp, RawEventKind::PointerPress { button, x, y })
    }

    pub fn pointer_release(timestamp: f64, button: MouseButton, x: u32, y: u32) -> Self {
        Self::new(timestamp, RawEventKind::PointerRelease { button, x, y })
    }

    pub fn scroll(timestamp: f64, x: u32, y: u32, dx: i32, dy: i32) -> Self {
        Self::new(timestamp, RawEventKind::Scroll { x, y, dx, dy })
    }

    pub fn key_press(timestamp: f64, key: Key) -> Self {
        Self::new(timestamp, RawEventKind::KeyPress { key })
    }

    pub fn key_release(timestamp: f64, key: Key) -> Self {
        Self::new(timestamp, RawEventKind::KeyRelease { key })
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn is_keyboard(&self) -> bool {
        matches!(
            self.kind,
            RawEventKind::KeyPress { .. } | RawEventKind::KeyRelease { .. }
        )
    }

    pub fn is_pointer(&self) -> bool {
        !self.is_keyboard()
    }

    pub fn is_press(&self) -> bool {
        matches!(
            self.kind,
            RawEventKind::PointerPress { .. } | RawEventKind::KeyPress { .. }
        )
    }

    /// Screen position for pointer and scroll events.
    pub fn position(&self) -> Option<(u32, u32)> {
        match self.kind {
            RawEventKind::PointerPress { x, y, .. }
            | RawEventKind::PointerRelease { x, y, .. }
            | RawEventKind::Scroll { x, y, .. } => Some((x, y)),
            RawEventKind::KeyPress { .. } | RawEventKind::KeyRelease { .. } => None,
        }
    }

    pub fn button(&self) -> Option<MouseButton> {
        match self.kind {
            RawEventKind::PointerPress { button, .. }
            | RawEventKind::PointerRelease { button, .. } => Some(button),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        match &self.kind {
            RawEventKind::KeyPress { key } | RawEventKind::KeyRelease { key } => Some(key),
            _ => None,
        }
    }

    pub fn control_name(&self) -> Option<&str> {
        self.context.control_name.as_deref()
    }

    /// Rejects events the segmenters cannot reason about.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.timestamp.is_finite() && self.timestamp >= 0.0,
            "invalid timestamp {}",
            self.timestamp
        );
        if let Some(key) = self.key() {
            ensure!(!key.name.is_empty(), "key event without a key identifier");
        }
        Ok(())
    }
}
