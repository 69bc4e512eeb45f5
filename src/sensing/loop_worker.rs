use tokio::sync::{mpsc, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{Interaction, RawEvent};
use crate::segmentation::SessionSegmenter;

use super::buffer::EventBuffer;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

/// Periodically drain the capture buffer and segment each drain as one batch.
///
/// Runs until cancelled, until a drain is requested (one last flush, then
/// exit) or until nobody listens for interactions anymore. Returns the
/// presses that were still waiting for a release.
pub async fn segmentation_loop(
    buffer: EventBuffer,
    mut segmenter: SessionSegmenter,
    flush_interval: Duration,
    sink: mpsc::UnboundedSender<Vec<Interaction>>,
    cancel_token: CancellationToken,
    mut drain_rx: watch::Receiver<bool>,
) -> Vec<RawEvent> {
    let mut ticker = tokio::time::interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("segmentation loop started for session {}", segmenter.session_id());

    loop {
        // Cancellation is polled first: stop() also drops the drain sender,
        // and a cancelled loop must leave the buffer untouched.
        tokio::select! {
            biased;

            _ = cancel_token.cancelled() => {
                log_info!("segmentation loop shutting down");
                break;
            }
            changed = drain_rx.changed() => {
                // A dropped sender means the controller is gone: flush and leave.
                if changed.is_err() || *drain_rx.borrow() {
                    flush(&buffer, &mut segmenter, &sink);
                    log_info!("segmentation loop drained for session {}", segmenter.session_id());
                    break;
                }
            }
            _ = ticker.tick() => {
                if !flush(&buffer, &mut segmenter, &sink) {
                    break;
                }
            }
        }
    }

    segmenter.finish()
}

/// Segment whatever is buffered. Returns false once the receiver is gone.
fn flush(
    buffer: &EventBuffer,
    segmenter: &mut SessionSegmenter,
    sink: &mpsc::UnboundedSender<Vec<Interaction>>,
) -> bool {
    let batch = buffer.drain();
    if batch.is_empty() {
        return !sink.is_closed();
    }

    let started = Instant::now();
    let batch_len = batch.len();
    match segmenter.process(batch) {
        Ok(interactions) => {
            log_debug!(
                "session {}: {} events -> {} interactions in {}us",
                segmenter.session_id(),
                batch_len,
                interactions.len(),
                started.elapsed().as_micros()
            );
            if !interactions.is_empty() && sink.send(interactions).is_err() {
                log_warn!("interaction receiver dropped, stopping segmentation");
                return false;
            }
        }
        Err(err) => log_error!(
            "segmentation failed for session {}: {err:?}",
            segmenter.session_id()
        ),
    }
    true
}
