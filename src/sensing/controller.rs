use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{Interaction, RawEvent};
use crate::segmentation::{SegmentationConfig, SessionSegmenter};

use super::buffer::EventBuffer;
use super::loop_worker::segmentation_loop;

/// Owns the background task that turns buffered raw events into interactions.
pub struct SegmentationController {
    handle: Option<JoinHandle<Vec<RawEvent>>>,
    cancel_token: Option<CancellationToken>,
    drain_tx: Option<watch::Sender<bool>>,
}

impl Default for SegmentationController {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
            drain_tx: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Start a capture session. Interactions arrive on the returned receiver,
    /// one batch per flush.
    pub async fn start(
        &mut self,
        buffer: EventBuffer,
        config: SegmentationConfig,
        flush_interval: Duration,
    ) -> Result<(Uuid, mpsc::UnboundedReceiver<Vec<Interaction>>)> {
        if self.handle.is_some() {
            bail!("segmentation already active");
        }
        if flush_interval.is_zero() {
            bail!("flush interval must be positive");
        }

        let segmenter = SessionSegmenter::new(config);
        let session_id = segmenter.session_id();
        info!("Starting segmentation for session {session_id} every {flush_interval:?}");

        let cancel_token = CancellationToken::new();
        let token_clone = cancel_token.clone();

        // Drain channel: false = normal operation, true = flush once more then exit
        let (drain_tx, drain_rx) = watch::channel(false);
        let (sink, interactions) = mpsc::unbounded_channel();

        let handle = tokio::spawn(segmentation_loop(
            buffer,
            segmenter,
            flush_interval,
            sink,
            token_clone,
            drain_rx,
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.drain_tx = Some(drain_tx);
        Ok((session_id, interactions))
    }

    /// Signal the loop to flush what is buffered and exit.
    pub fn drain(&mut self) {
        if let Some(tx) = &self.drain_tx {
            let _ = tx.send(true);
            info!("Drain signal sent to segmentation loop");
        }
    }

    /// Drain, wait for the loop to exit and return presses left without a release.
    pub async fn finish(&mut self) -> Result<Vec<RawEvent>> {
        self.drain();
        self.join().await
    }

    /// Cancel without a final flush; buffered events stay in the buffer.
    pub async fn stop(&mut self) -> Result<Vec<RawEvent>> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        self.join().await
    }

    async fn join(&mut self) -> Result<Vec<RawEvent>> {
        self.cancel_token = None;
        self.drain_tx = None;
        match self.handle.take() {
            Some(handle) => handle
                .await
                .context("segmentation loop task failed to join"),
            None => Ok(Vec::new()),
        }
    }
}
