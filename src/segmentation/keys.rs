use anyhow::Result;

use crate::models::{Interaction, InteractionKind, RawEvent, RawEventKind};
use crate::segmentation::config::SegmentationConfig;

const ENABLE_LOGS: bool = true;

use crate::log_debug;

/// A key press and its release, waiting to be classified as a lone press or
/// part of a typing run.
#[derive(Debug, Clone)]
pub struct KeyCandidate {
    pub press: RawEvent,
    pub release: RawEvent,
}

impl KeyCandidate {
    pub fn pressed_at(&self) -> f64 {
        self.press.timestamp
    }

    pub fn control_name(&self) -> Option<&str> {
        self.press.control_name()
    }
}

/// Output of the key press/release pairing pass.
#[derive(Debug, Default)]
pub struct KeyPairing {
    pub held: Vec<Interaction>,
    /// In chronological press order.
    pub candidates: Vec<KeyCandidate>,
    /// Presses (and their auto-repeats) whose release never showed up.
    pub unmatched: Vec<RawEvent>,
}

/// Pair every key press with the next unclaimed release of the same key.
///
/// Repeated presses of the key before that release mean the key is being
/// held: the repeats are swallowed and the pair becomes a held-key
/// interaction over the original press and the final release. Plain pairs
/// are deferred as candidates for typing resolution.
pub fn pair_key_events(events: &[RawEvent]) -> Result<KeyPairing> {
    let mut pairing = KeyPairing::default();
    let mut consumed = vec![false; events.len()];

    for (i, event) in events.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        let RawEventKind::KeyPress { key } = &event.kind else {
            continue;
        };

        let mut repeats = Vec::new();
        let mut release = None;
        for (j, later) in events.iter().enumerate().skip(i + 1) {
            if consumed[j] {
                continue;
            }
            match &later.kind {
                RawEventKind::KeyRelease { key: released } if released == key => {
                    release = Some(j);
                    break;
                }
                RawEventKind::KeyPress { key: pressed } if pressed == key => repeats.push(j),
                _ => {}
            }
        }

        for &j in &repeats {
            consumed[j] = true;
        }

        let Some(j) = release else {
            log_debug!(
                "key {} pressed at {:.3}s has no release in this batch",
                key.label(),
                event.timestamp
            );
            pairing.unmatched.push(event.clone());
            pairing
                .unmatched
                .extend(repeats.iter().map(|&r| events[r].clone()));
            continue;
        };
        consumed[j] = true;

        if repeats.is_empty() {
            pairing.candidates.push(KeyCandidate {
                press: event.clone(),
                release: events[j].clone(),
            });
        } else {
            pairing.held.push(Interaction::new(
                InteractionKind::KeyHeld,
                vec![event.clone(), events[j].clone()],
            )?);
        }
    }

    Ok(pairing)
}

/// Classify key candidates into lone presses and typing runs.
///
/// A candidate is a lone press when both neighbours (by press time) are more
/// than the typing gap away. The rest are split into runs wherever the gap to
/// the next press is exceeded or the target control differs from the one the
/// current run was typed into. A run keeps only the press events.
pub fn resolve_typing(
    candidates: Vec<KeyCandidate>,
    config: &SegmentationConfig,
) -> Result<Vec<Interaction>> {
    let gap = config.typing_gap_secs;

    let isolated: Vec<bool> = (0..candidates.len())
        .map(|i| {
            let current = candidates[i].pressed_at();
            let near = |other: &KeyCandidate| (other.pressed_at() - current).abs() <= gap;
            let prev = i.checked_sub(1).map(|p| &candidates[p]);
            let next = candidates.get(i + 1);
            !(prev.is_some_and(|other| near(other)) || next.is_some_and(|other| near(other)))
        })
        .collect();

    let mut interactions = Vec::new();
    let mut run: Vec<RawEvent> = Vec::new();
    let mut run_control: Option<String> = None;
    let mut last_press_at = f64::NEG_INFINITY;

    for (candidate, isolated) in candidates.into_iter().zip(isolated) {
        if isolated {
            interactions.push(Interaction::new(
                InteractionKind::SingleKeyPress,
                vec![candidate.press, candidate.release],
            )?);
            continue;
        }

        let pressed_at = candidate.pressed_at();
        if !run.is_empty() {
            let gap_exceeded = pressed_at - last_press_at > gap;
            let control_changed = candidate.control_name() != run_control.as_deref();
            if gap_exceeded || control_changed {
                interactions.push(Interaction::new(
                    InteractionKind::Typing,
                    std::mem::take(&mut run),
                )?);
            }
        }
        if run.is_empty() {
            run_control = candidate.control_name().map(str::to_owned);
        }

        last_press_at = pressed_at;
        run.push(candidate.press);
    }

    if !run.is_empty() {
        interactions.push(Interaction::new(InteractionKind::Typing, run)?);
    }

    Ok(interactions)
}
