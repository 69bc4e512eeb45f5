use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use super::event::{Context, RawEvent, RawEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionKind {
    Click,
    DoubleClick,
    Drag,
    Scroll,
    SingleKeyPress,
    KeyHeld,
    Typing,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Click => "click",
            InteractionKind::DoubleClick => "double click",
            InteractionKind::Drag => "drag",
            InteractionKind::Scroll => "scroll",
            InteractionKind::SingleKeyPress => "single key press",
            InteractionKind::KeyHeld => "key held",
            InteractionKind::Typing => "typing",
        }
    }
}

/// A classified group of raw events representing one user action.
///
/// Always holds at least one event; the events are kept in the order they
/// were grouped, which is chronological for every segmenter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    kind: InteractionKind,
    start_timestamp: f64,
    end_timestamp: f64,
    events: Vec<RawEvent>,
}

impl Interaction {
    pub fn new(kind: InteractionKind, events: Vec<RawEvent>) -> Result<Self> {
        let (Some(first), Some(last)) = (events.first(), events.last()) else {
            anyhow::bail!("{} interaction built from zero events", kind.as_str());
        };
        let start_timestamp = first.timestamp;
        let end_timestamp = last.timestamp;
        ensure!(
            start_timestamp <= end_timestamp,
            "{} interaction events out of order ({} > {})",
            kind.as_str(),
            start_timestamp,
            end_timestamp
        );

        Ok(Self {
            kind,
            start_timestamp,
            end_timestamp,
            events,
        })
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn events(&self) -> &[RawEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<RawEvent> {
        self.events
    }

    pub fn start_timestamp(&self) -> f64 {
        self.start_timestamp
    }

    pub fn end_timestamp(&self) -> f64 {
        self.end_timestamp
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_timestamp - self.start_timestamp
    }

    pub fn first_event(&self) -> &RawEvent {
        &self.events[0]
    }

    pub fn last_event(&self) -> &RawEvent {
        &self.events[self.events.len() - 1]
    }

    /// Context of the event that started the interaction.
    pub fn context(&self) -> &Context {
        &self.first_event().context
    }

    /// Characters produced by the key events, in order. Keys without a
    /// character contribute nothing.
    pub fn typed_text(&self) -> String {
        self.events
            .iter()
            .filter_map(|event| event.key().and_then(|key| key.char))
            .collect()
    }

    /// Summed (dx, dy) over the scroll events.
    pub fn scroll_totals(&self) -> (i64, i64) {
        self.events
            .iter()
            .fold((0, 0), |(sum_dx, sum_dy), event| match event.kind {
                RawEventKind::Scroll { dx, dy, .. } => (sum_dx + dx as i64, sum_dy + dy as i64),
                _ => (sum_dx, sum_dy),
            })
    }
}
