use anyhow::Result;
use uuid::Uuid;

use crate::models::{Interaction, RawEvent};
use crate::segmentation::clicks::{pair_pointer_events, resolve_clicks};
use crate::segmentation::config::SegmentationConfig;
use crate::segmentation::keys::{pair_key_events, resolve_typing};
use crate::segmentation::scroll::group_scrolls;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Everything one segmentation pass produced.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Sorted by start timestamp.
    pub interactions: Vec<Interaction>,
    /// Presses still waiting for a release when the batch ended, oldest first.
    pub unmatched: Vec<RawEvent>,
    /// Malformed events that were left out.
    pub skipped: usize,
}

/// Main segmentation function: turns one drained batch of raw events into
/// classified interactions.
pub fn segment_batch(events: Vec<RawEvent>, config: &SegmentationConfig) -> Result<BatchOutcome> {
    // Edge case: empty batch
    if events.is_empty() {
        return Ok(BatchOutcome::default());
    }

    // Step 1: Drop what the segmenters cannot reason about
    let (mut events, skipped) = validate_batch(events);

    // Step 2: Producers interleave independently, so restore time order.
    // Stable, so simultaneous events keep their capture order.
    events.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    let (keyboard, pointer): (Vec<RawEvent>, Vec<RawEvent>) =
        events.into_iter().partition(|event| event.is_keyboard());

    // Step 3: Pointer pipeline
    let pointer_pairing = pair_pointer_events(&pointer)?;
    let mut interactions = pointer_pairing.drags;
    interactions.extend(resolve_clicks(pointer_pairing.candidates, config)?);
    interactions.extend(group_scrolls(&pointer)?);

    // Step 4: Keyboard pipeline
    let key_pairing = pair_key_events(&keyboard)?;
    interactions.extend(key_pairing.held);
    interactions.extend(resolve_typing(key_pairing.candidates, config)?);

    // Step 5: Merge and order
    interactions.sort_by(|a, b| a.start_timestamp().total_cmp(&b.start_timestamp()));

    let mut unmatched = pointer_pairing.unmatched;
    unmatched.extend(key_pairing.unmatched);
    unmatched.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

    log_debug!(
        "segmented {} pointer and {} keyboard events into {} interactions ({} unmatched, {} skipped)",
        pointer.len(),
        keyboard.len(),
        interactions.len(),
        unmatched.len(),
        skipped
    );

    Ok(BatchOutcome {
        interactions,
        unmatched,
        skipped,
    })
}

/// Split off malformed events, keeping the rest in their original order.
pub fn validate_batch(events: Vec<RawEvent>) -> (Vec<RawEvent>, usize) {
    let total = events.len();
    let valid: Vec<RawEvent> = events
        .into_iter()
        .filter(|event| match event.validate() {
            Ok(()) => true,
            Err(err) => {
                log_warn!("skipping malformed input event: {err}");
                false
            }
        })
        .collect();
    let skipped = total - valid.len();
    (valid, skipped)
}

/// Segments consecutive batches drained from one capture session, carrying
/// presses whose release has not arrived yet into the next batch.
pub struct SessionSegmenter {
    session_id: Uuid,
    config: SegmentationConfig,
    pending: Vec<RawEvent>,
}

impl SessionSegmenter {
    pub fn new(config: SegmentationConfig) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            config,
            pending: Vec::new(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    /// Presses held back for the next batch.
    pub fn pending(&self) -> &[RawEvent] {
        &self.pending
    }

    pub fn process(&mut self, batch: Vec<RawEvent>) -> Result<Vec<Interaction>> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }

        let newest = batch
            .iter()
            .map(|event| event.timestamp)
            .filter(|timestamp| timestamp.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);

        let carried = self.take_fresh_pending(newest);
        let mut events = self.drop_orphaned_presses(carried, &batch);
        events.extend(batch);

        let outcome = segment_batch(events, &self.config)?;

        if self.config.carry_unmatched_presses {
            if !outcome.unmatched.is_empty() {
                log_debug!(
                    "session {}: carrying {} unreleased presses forward",
                    self.session_id,
                    outcome.unmatched.len()
                );
            }
            self.pending = outcome.unmatched;
        } else if !outcome.unmatched.is_empty() {
            log_warn!(
                "session {}: dropping {} presses without a release",
                self.session_id,
                outcome.unmatched.len()
            );
        }

        Ok(outcome.interactions)
    }

    /// End the session, handing back presses that never got a release.
    pub fn finish(self) -> Vec<RawEvent> {
        if !self.pending.is_empty() {
            log_info!(
                "session {} finished with {} unreleased presses",
                self.session_id,
                self.pending.len()
            );
        }
        self.pending
    }

    fn take_fresh_pending(&mut self, newest: f64) -> Vec<RawEvent> {
        let max_age = self.config.max_carry_age_secs;
        let (fresh, stale): (Vec<RawEvent>, Vec<RawEvent>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|event| newest - event.timestamp <= max_age);

        if !stale.is_empty() {
            log_warn!(
                "session {}: giving up on {} presses older than {}s",
                self.session_id,
                stale.len(),
                max_age
            );
        }
        fresh
    }

    /// A button cannot go down twice without coming up. A carried pointer
    /// press whose next same-button event in the batch is another press lost
    /// its release, and would otherwise steal the release of that press.
    fn drop_orphaned_presses(&self, carried: Vec<RawEvent>, batch: &[RawEvent]) -> Vec<RawEvent> {
        let (kept, orphaned): (Vec<RawEvent>, Vec<RawEvent>) =
            carried.into_iter().partition(|press| {
                let Some(button) = press.button() else {
                    return true;
                };
                // On equal timestamps the release wins
                batch
                    .iter()
                    .filter(|event| event.button() == Some(button) && event.timestamp >= press.timestamp)
                    .min_by(|a, b| {
                        a.timestamp
                            .total_cmp(&b.timestamp)
                            .then(a.is_press().cmp(&b.is_press()))
                    })
                    .map_or(true, |next| !next.is_press())
            });

        for press in &orphaned {
            log_warn!(
                "session {}: dropping {} press at {:.3}s, its release was lost",
                self.session_id,
                press.button().map_or("pointer", |button| button.as_str()),
                press.timestamp
            );
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Context, InteractionKind, Key, MouseButton};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn kinds(interactions: &[Interaction]) -> Vec<InteractionKind> {
        interactions.iter().map(|i| i.kind()).collect()
    }

    fn random_batch(rng: &mut StdRng, len: usize) -> Vec<RawEvent> {
        let buttons = [MouseButton::Primary, MouseButton::Secondary, MouseButton::Middle];
        let keys = ['a', 'b', 'c'];
        let controls = ["Editor", "Sidebar"];
        let mut at = 0.0;
        (0..len)
            .map(|_| {
                at += rng.gen_range(0.01..1.0);
                let button = buttons[rng.gen_range(0..buttons.len())];
                let key = Key::printable(keys[rng.gen_range(0..keys.len())]);
                let x = rng.gen_range(0..3);
                let event = match rng.gen_range(0..5) {
                    0 => RawEvent::pointer_press(at, button, x, 0),
                    1 => RawEvent::pointer_release(at, button, x, 0),
                    2 => RawEvent::scroll(at, x, 0, rng.gen_range(-2..3), rng.gen_range(-2..3)),
                    3 => RawEvent::key_press(at, key),
                    _ => RawEvent::key_release(at, key),
                };
                event.with_context(Context {
                    control_name: Some(controls[rng.gen_range(0..controls.len())].to_string()),
                    ..Context::default()
                })
            })
            .collect()
    }

    #[test]
    fn empty_batch_yields_nothing() {
        let outcome = segment_batch(Vec::new(), &SegmentationConfig::default()).unwrap();
        assert!(outcome.interactions.is_empty());
        assert!(outcome.unmatched.is_empty());
    }

    #[test]
    fn merged_output_is_sorted_by_start() {
        let mut events = vec![
            RawEvent::key_press(0.5, Key::printable('x')),
            RawEvent::key_release(0.6, Key::printable('x')),
            RawEvent::scroll(3.0, 1, 1, 0, -1),
            RawEvent::pointer_press(1.0, MouseButton::Primary, 10, 10),
            RawEvent::pointer_release(1.3, MouseButton::Primary, 50, 50),
        ];
        // Out of order on purpose: keyboard and pointer producers interleave.
        events.reverse();
        let outcome = segment_batch(events, &SegmentationConfig::default()).unwrap();
        assert_eq!(
            kinds(&outcome.interactions),
            vec![
                InteractionKind::SingleKeyPress,
                InteractionKind::Drag,
                InteractionKind::Scroll
            ]
        );
    }

    #[test]
    fn malformed_events_are_skipped_not_fatal() {
        let events = vec![
            RawEvent::pointer_press(f64::NAN, MouseButton::Primary, 1, 1),
            RawEvent::key_press(1.0, Key::named("")),
            RawEvent::pointer_press(2.0, MouseButton::Primary, 1, 1),
            RawEvent::pointer_release(2.1, MouseButton::Primary, 1, 1),
        ];
        let outcome = segment_batch(events, &SegmentationConfig::default()).unwrap();
        assert_eq!(outcome.skipped, 2);
        assert_eq!(kinds(&outcome.interactions), vec![InteractionKind::Click]);
    }

    #[test]
    fn mixed_recording_classifies_every_kind() {
        let config = SegmentationConfig::default();
        let p = MouseButton::Primary;
        let mut events = vec![
            // click
            RawEvent::pointer_press(0.0, p, 5, 5),
            RawEvent::pointer_release(0.1, p, 5, 5),
            // double click
            RawEvent::pointer_press(2.0, p, 7, 7),
            RawEvent::pointer_release(2.1, p, 7, 7),
            RawEvent::pointer_press(2.3, p, 7, 7),
            RawEvent::pointer_release(2.4, p, 7, 7),
            // drag
            RawEvent::pointer_press(4.0, p, 10, 10),
            RawEvent::pointer_release(4.5, p, 40, 40),
        ];
        for i in 0..3 {
            events.push(RawEvent::scroll(6.0 + i as f64 * 0.1, 1, 1, 0, -1));
        }
        for (i, c) in "hey".chars().enumerate() {
            let at = 8.0 + i as f64 * 0.2;
            events.push(RawEvent::key_press(at, Key::printable(c)));
            events.push(RawEvent::key_release(at + 0.05, Key::printable(c)));
        }
        let t = Key::printable('t');
        events.push(RawEvent::key_press(12.0, t.clone()));
        events.push(RawEvent::key_press(12.5, t.clone()));
        events.push(RawEvent::key_release(14.0, t));
        events.push(RawEvent::key_press(17.0, Key::named("Enter")));
        events.push(RawEvent::key_release(17.1, Key::named("Enter")));

        let outcome = segment_batch(events, &config).unwrap();
        assert_eq!(
            kinds(&outcome.interactions),
            vec![
                InteractionKind::Click,
                InteractionKind::DoubleClick,
                InteractionKind::Drag,
                InteractionKind::Scroll,
                InteractionKind::Typing,
                InteractionKind::KeyHeld,
                InteractionKind::SingleKeyPress,
            ]
        );
        assert_eq!(outcome.interactions[4].typed_text(), "hey");
    }

    #[test]
    fn random_batches_keep_structural_invariants() {
        let mut rng = StdRng::seed_from_u64(7);
        let config = SegmentationConfig::default();
        for _ in 0..200 {
            let len = rng.gen_range(0..40);
            let outcome = segment_batch(random_batch(&mut rng, len), &config).unwrap();

            let starts: Vec<f64> = outcome.interactions.iter().map(|i| i.start_timestamp()).collect();
            assert!(starts.windows(2).all(|w| w[0] <= w[1]));

            let mut seen = Vec::new();
            for interaction in &outcome.interactions {
                assert!(!interaction.events().is_empty());
                assert!(interaction.start_timestamp() <= interaction.end_timestamp());
                if matches!(
                    interaction.kind(),
                    InteractionKind::Click | InteractionKind::DoubleClick | InteractionKind::Drag
                ) {
                    for event in interaction.events() {
                        // Timestamps are strictly increasing in random_batch, so
                        // they identify events.
                        let stamp = event.timestamp.to_bits();
                        assert!(!seen.contains(&stamp), "event used twice");
                        seen.push(stamp);
                    }
                }
            }
        }
    }

    #[test]
    fn unreleased_press_is_carried_into_next_batch() {
        let mut session = SessionSegmenter::new(SegmentationConfig::default());
        let first = session
            .process(vec![
                RawEvent::scroll(0.5, 1, 1, 0, -1),
                RawEvent::pointer_press(1.0, MouseButton::Primary, 10, 10),
            ])
            .unwrap();
        assert_eq!(kinds(&first), vec![InteractionKind::Scroll]);
        assert_eq!(session.pending().len(), 1);

        let second = session
            .process(vec![RawEvent::pointer_release(1.8, MouseButton::Primary, 90, 40)])
            .unwrap();
        assert_eq!(kinds(&second), vec![InteractionKind::Drag]);
        assert_eq!(second[0].start_timestamp(), 1.0);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn lost_release_does_not_turn_later_clicks_into_drags() {
        let mut session = SessionSegmenter::new(SegmentationConfig::default());
        session
            .process(vec![RawEvent::pointer_press(1.0, MouseButton::Primary, 10, 10)])
            .unwrap();
        assert_eq!(session.pending().len(), 1);

        let mut clicks = 0;
        for i in 0..5 {
            let at = 10.0 + i as f64 * 5.0;
            let x = 100 + i * 50;
            let batch = session
                .process(vec![
                    RawEvent::pointer_press(at, MouseButton::Primary, x, 100),
                    RawEvent::pointer_release(at + 0.1, MouseButton::Primary, x, 100),
                ])
                .unwrap();
            assert_eq!(kinds(&batch), vec![InteractionKind::Click]);
            assert_eq!(batch[0].start_timestamp(), at);
            clicks += 1;
        }
        assert_eq!(clicks, 5);
        assert!(session.pending().is_empty());
    }

    #[test]
    fn carried_press_of_another_button_survives_a_click() {
        let mut session = SessionSegmenter::new(SegmentationConfig::default());
        session
            .process(vec![RawEvent::pointer_press(1.0, MouseButton::Secondary, 10, 10)])
            .unwrap();

        let batch = session
            .process(vec![
                RawEvent::pointer_press(2.0, MouseButton::Primary, 50, 50),
                RawEvent::pointer_release(2.1, MouseButton::Primary, 50, 50),
                RawEvent::pointer_release(3.0, MouseButton::Secondary, 60, 80),
            ])
            .unwrap();
        assert_eq!(
            kinds(&batch),
            vec![InteractionKind::Drag, InteractionKind::Click]
        );
        assert_eq!(batch[0].start_timestamp(), 1.0);
    }

    #[test]
    fn held_key_spanning_batches_is_still_held() {
        let mut session = SessionSegmenter::new(SegmentationConfig::default());
        let k = Key::printable('k');
        let first = session
            .process(vec![
                RawEvent::key_press(1.0, k.clone()),
                RawEvent::key_press(1.5, k.clone()),
            ])
            .unwrap();
        assert!(first.is_empty());

        let second = session
            .process(vec![
                RawEvent::key_press(1.55, k.clone()),
                RawEvent::key_release(2.0, k),
            ])
            .unwrap();
        assert_eq!(kinds(&second), vec![InteractionKind::KeyHeld]);
        assert_eq!(second[0].start_timestamp(), 1.0);
    }

    #[test]
    fn batch_ending_mid_press_drops_it_when_carry_is_off() {
        let config = SegmentationConfig {
            carry_unmatched_presses: false,
            ..SegmentationConfig::default()
        };
        let mut session = SessionSegmenter::new(config);
        let first = session
            .process(vec![RawEvent::pointer_press(1.0, MouseButton::Primary, 10, 10)])
            .unwrap();
        assert!(first.is_empty());
        assert!(session.pending().is_empty());

        let second = session
            .process(vec![RawEvent::pointer_release(1.8, MouseButton::Primary, 10, 10)])
            .unwrap();
        assert!(second.is_empty());
    }

    #[test]
    fn stale_carried_press_is_given_up() {
        let config = SegmentationConfig {
            max_carry_age_secs: 5.0,
            ..SegmentationConfig::default()
        };
        let mut session = SessionSegmenter::new(config);
        session
            .process(vec![RawEvent::pointer_press(1.0, MouseButton::Primary, 10, 10)])
            .unwrap();
        let later = session
            .process(vec![RawEvent::pointer_release(20.0, MouseButton::Primary, 10, 10)])
            .unwrap();
        assert!(later.is_empty());
        assert!(session.finish().is_empty());
    }

    #[test]
    fn finish_returns_unreleased_presses() {
        let mut session = SessionSegmenter::new(SegmentationConfig::default());
        session
            .process(vec![RawEvent::key_press(1.0, Key::named("Ctrl"))])
            .unwrap();
        let leftover = session.finish();
        assert_eq!(leftover.len(), 1);
        assert_eq!(leftover[0].key(), Some(&Key::named("Ctrl")));
    }
}
