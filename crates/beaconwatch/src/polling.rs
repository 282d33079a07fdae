//! Turns a pollable chain head query into a stream of chain head changes.
//!
//! A [`ChainHeadPoller`] is started exactly once and yields a
//! [`ChainHeadSubscription`]. The spawned task owns the last emitted head, so
//! only changed heads are delivered and no locking is involved. Poll failures
//! are logged and never end the stream; only [`ChainHeadSubscription::stop`]
//! (or dropping the subscription) does.

use crate::{BeaconError, ChainHead};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Default number of heads buffered for a slow subscriber
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Anything that can fetch the current chain head
#[async_trait]
pub trait ChainHeadSource: Send + Sync {
    async fn chain_head(&self) -> Result<ChainHead, BeaconError>;
}

/// A chain head poller that has not been started yet
pub struct ChainHeadPoller<S: ?Sized> {
    source: Arc<S>,
    interval: Duration,
    capacity: usize,
}

impl<S: ChainHeadSource + ?Sized + 'static> ChainHeadPoller<S> {
    pub fn new(source: Arc<S>, interval: Duration) -> Self {
        Self {
            source,
            interval: interval.max(MIN_POLL_INTERVAL),
            capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Number of heads buffered before the poller waits on the subscriber
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Spawn the polling task. The first poll happens immediately.
    pub fn start(self) -> ChainHeadSubscription {
        let (heads_tx, heads_rx) = mpsc::channel(self.capacity);
        let (stop_tx, stop_rx) = watch::channel(false);

        let handle = tokio::spawn(poll_chain_heads(
            self.source,
            self.interval,
            heads_tx,
            stop_rx,
        ));

        ChainHeadSubscription {
            heads: heads_rx,
            stop: stop_tx,
            handle: Some(handle),
        }
    }
}

/// A running chain head subscription. Dropping it stops the polling task.
pub struct ChainHeadSubscription {
    heads: mpsc::Receiver<ChainHead>,
    stop: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl ChainHeadSubscription {
    /// Wait for the next changed head. Returns `None` once stopped; heads
    /// still buffered at that point are discarded.
    pub async fn recv(&mut self) -> Option<ChainHead> {
        if self.is_stopped() {
            return None;
        }
        self.heads.recv().await
    }

    pub fn try_recv(&mut self) -> Option<ChainHead> {
        if self.is_stopped() {
            return None;
        }
        self.heads.try_recv().ok()
    }

    /// Signal the polling task to exit. Calling it again does nothing.
    pub fn stop(&self) {
        self.stop.send_if_modified(|stopped| !std::mem::replace(stopped, true));
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
            || self
                .handle
                .as_ref()
                .is_none_or(|handle| handle.is_finished())
    }

    /// Stop and wait for the polling task to exit.
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::error!("Chain head polling task failed: {}", e);
            }
        }
    }
}

impl Drop for ChainHeadSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_chain_heads<S: ChainHeadSource + ?Sized>(
    source: Arc<S>,
    period: Duration,
    heads: mpsc::Sender<ChainHead>,
    mut stop: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last: Option<ChainHead> = None;

    // Every await races the stop signal. A dropped sender also ends the wait.
    loop {
        tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => break,
            _ = interval.tick() => {}
        }

        let result = tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => break,
            result = source.chain_head() => result,
        };

        let head = match result {
            Ok(head) => head,
            Err(e) => {
                tracing::warn!("Failed to poll chain head: {}", e);
                continue;
            }
        };

        if last.as_ref() == Some(&head) {
            continue;
        }

        tracing::debug!(
            head_slot = head.head_slot,
            head_block_root = %head.head_block_root,
            finalized_slot = head.finalized_slot,
            justified_slot = head.justified_slot,
            "New chain head"
        );

        tokio::select! {
            biased;
            _ = stop.wait_for(|stopped| *stopped) => break,
            sent = heads.send(head.clone()) => {
                if sent.is_err() {
                    break;
                }
            }
        }

        last = Some(head);
    }

    tracing::debug!("Chain head polling stopped");
}
