use anyhow::Result;

use crate::models::{Interaction, InteractionKind, MouseButton, RawEvent, RawEventKind};
use crate::segmentation::config::SegmentationConfig;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// A press/release pair at the same position, waiting to be classified as a
/// click or half of a double click.
#[derive(Debug, Clone)]
pub struct ClickCandidate {
    pub press: RawEvent,
    pub release: RawEvent,
}

impl ClickCandidate {
    pub fn button(&self) -> Option<MouseButton> {
        self.press.button()
    }

    pub fn pressed_at(&self) -> f64 {
        self.press.timestamp
    }

    fn into_click(self) -> Result<Interaction> {
        Interaction::new(InteractionKind::Click, vec![self.press, self.release])
    }
}

/// Output of the press/release pairing pass.
#[derive(Debug, Default)]
pub struct PointerPairing {
    pub drags: Vec<Interaction>,
    /// In chronological press order.
    pub candidates: Vec<ClickCandidate>,
    /// Presses whose release never showed up in the batch.
    pub unmatched: Vec<RawEvent>,
}

/// Pair every pointer press with the first later release of the same button
/// that no earlier press has claimed.
///
/// Moved pairs become drags right away, stationary pairs are deferred as
/// click candidates. Scroll and keyboard events are ignored.
pub fn pair_pointer_events(events: &[RawEvent]) -> Result<PointerPairing> {
    let mut pairing = PointerPairing::default();
    let mut claimed = vec![false; events.len()];

    for (i, event) in events.iter().enumerate() {
        let RawEventKind::PointerPress { button, x, y } = event.kind else {
            continue;
        };

        let release = events
            .iter()
            .enumerate()
            .skip(i + 1)
            .find(|(j, candidate)| {
                !claimed[*j]
                    && matches!(
                        candidate.kind,
                        RawEventKind::PointerRelease { button: released, .. } if released == button
                    )
            });

        let Some((j, release)) = release else {
            log_debug!(
                "{} press at {:.3}s has no release in this batch",
                button.as_str(),
                event.timestamp
            );
            pairing.unmatched.push(event.clone());
            continue;
        };
        claimed[j] = true;

        if release.position() != Some((x, y)) {
            pairing.drags.push(Interaction::new(
                InteractionKind::Drag,
                vec![event.clone(), release.clone()],
            )?);
        } else {
            pairing.candidates.push(ClickCandidate {
                press: event.clone(),
                release: release.clone(),
            });
        }
    }

    Ok(pairing)
}

/// Classify click candidates into single and double clicks.
///
/// A candidate is isolated when neither neighbour (by press order) is the
/// same button pressed within the double-click window. Isolated candidates
/// are clicks; the rest are paired off in order into double clicks.
pub fn resolve_clicks(
    candidates: Vec<ClickCandidate>,
    config: &SegmentationConfig,
) -> Result<Vec<Interaction>> {
    let window = config.double_click_window_secs;

    let isolated: Vec<bool> = (0..candidates.len())
        .map(|i| {
            let current = &candidates[i];
            let near = |other: &ClickCandidate| {
                other.button() == current.button()
                    && (other.pressed_at() - current.pressed_at()).abs() <= window
            };
            let prev = i.checked_sub(1).map(|p| &candidates[p]);
            let next = candidates.get(i + 1);
            !(prev.is_some_and(|other| near(other)) || next.is_some_and(|other| near(other)))
        })
        .collect();

    let mut interactions = Vec::new();
    let mut paired = Vec::new();

    for (candidate, isolated) in candidates.into_iter().zip(isolated) {
        if isolated {
            interactions.push(candidate.into_click()?);
        } else {
            paired.push(candidate);
        }
    }

    let mut remaining = paired.into_iter();
    while let Some(first) = remaining.next() {
        match remaining.next() {
            Some(second) => {
                interactions.push(Interaction::new(
                    InteractionKind::DoubleClick,
                    vec![first.press, first.release, second.press, second.release],
                )?);
            }
            None => {
                // Triple clicks and interleaved buttons can leave one over.
                log_warn!(
                    "unpaired rapid click at {:.3}s kept as a single click",
                    first.pressed_at()
                );
                interactions.push(first.into_click()?);
            }
        }
    }

    Ok(interactions)
}
