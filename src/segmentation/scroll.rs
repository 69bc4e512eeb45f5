use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::models::{Interaction, InteractionKind, RawEvent, RawEventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    Left,
    Right,
}

/// Direction of a scroll tick. A zero delta counts as up/right.
pub fn scroll_direction(dx: i32, dy: i32) -> (Horizontal, Vertical) {
    let horizontal = if dx < 0 {
        Horizontal::Left
    } else {
        Horizontal::Right
    };
    let vertical = if dy < 0 { Vertical::Down } else { Vertical::Up };
    (horizontal, vertical)
}

/// Scroll events sharing direction and target control.
struct ScrollRun {
    direction: (Horizontal, Vertical),
    control: Option<String>,
    events: Vec<RawEvent>,
}

impl ScrollRun {
    fn accepts(&self, direction: (Horizontal, Vertical), control: Option<&str>) -> bool {
        self.direction == direction && self.control.as_deref() == control
    }
}

/// Merge consecutive same-direction, same-control scroll events into one
/// scroll interaction each.
///
/// Only scroll events take part; clicks or keys recorded in between do not
/// end a run.
pub fn group_scrolls(events: &[RawEvent]) -> Result<Vec<Interaction>> {
    let mut interactions = Vec::new();
    let mut current: Option<ScrollRun> = None;

    for event in events {
        let RawEventKind::Scroll { dx, dy, .. } = event.kind else {
            continue;
        };
        let direction = scroll_direction(dx, dy);

        match &mut current {
            Some(run) if run.accepts(direction, event.control_name()) => {
                run.events.push(event.clone());
            }
            _ => {
                if let Some(run) = current.take() {
                    interactions.push(Interaction::new(InteractionKind::Scroll, run.events)?);
                }
                current = Some(ScrollRun {
                    direction,
                    control: event.context.control_name.clone(),
                    events: vec![event.clone()],
                });
            }
        }
    }

    if let Some(run) = current {
        interactions.push(Interaction::new(InteractionKind::Scroll, run.events)?);
    }

    Ok(interactions)
}
