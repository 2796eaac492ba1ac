//! Sender: the single background task draining the delivery queue.

use crate::{
    DeliveryQueue, DeviceContext, EnrichedEnvelope, Envelope, NetworkProbe, OutboxResult,
    Transport,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Wait before re-checking reachability while offline.
pub const NETWORK_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Wait before retrying the same head after a failed transmission.
pub const FAILURE_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Delay in the WaitingForNetwork state.
    pub network_retry_delay: Duration,
    /// Delay in the WaitingAfterFailure state.
    pub failure_retry_delay: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            network_retry_delay: NETWORK_RETRY_DELAY,
            failure_retry_delay: FAILURE_RETRY_DELAY,
        }
    }
}

/// Sender state machine.
///
/// `Idle -> Sending -> {WaitingForNetwork, WaitingAfterFailure} -> Sending -> ... -> Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Sending,
    WaitingForNetwork,
    WaitingAfterFailure,
}

/// Monotonic per-process delivery counters.
#[derive(Debug, Default)]
pub(crate) struct SenderStats {
    pub runs: AtomicU64,
    pub attempts: AtomicU64,
    pub delivered: AtomicU64,
    pub failures: AtomicU64,
    pub network_waits: AtomicU64,
}

impl SenderStats {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Drains the queue head-first, never skipping or reordering envelopes.
///
/// At most one `run` may be in flight per queue; the caller obtains that
/// right from [`DeliveryQueue::enqueue`] or `try_claim_sender` before
/// spawning it.
#[derive(Clone)]
pub struct Sender {
    queue: Arc<DeliveryQueue>,
    transport: Arc<dyn Transport>,
    network: Arc<dyn NetworkProbe>,
    context: Arc<DeviceContext>,
    config: SenderConfig,
    stats: Arc<SenderStats>,
    idle: Arc<Notify>,
}

impl Sender {
    pub fn new(
        queue: Arc<DeliveryQueue>,
        transport: Arc<dyn Transport>,
        network: Arc<dyn NetworkProbe>,
        context: Arc<DeviceContext>,
        config: SenderConfig,
    ) -> Self {
        Self {
            queue,
            transport,
            network,
            context,
            config,
            stats: Arc::new(SenderStats::default()),
            idle: Arc::new(Notify::new()),
        }
    }

    pub(crate) fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Notified whenever a sender run ends.
    pub(crate) fn idle_signal(&self) -> &Notify {
        &self.idle
    }

    /// Run until the queue is empty.
    ///
    /// If the task is dropped mid-run (runtime shutdown, abort) the sender
    /// slot is released so a later enqueue can start a fresh run.
    pub async fn run(self) {
        SenderStats::bump(&self.stats.runs);
        info!(pending = self.queue.len(), "Sender started");

        let mut slot = SenderSlot {
            queue: &self.queue,
            idle: &self.idle,
            held: true,
        };

        let mut state = SenderState::Sending;
        while state != SenderState::Idle {
            state = self.step(state).await;
        }

        // head_or_release already cleared the flag under the queue lock.
        slot.held = false;
        debug!("Sender idle");
    }

    /// Perform one transition of the state machine.
    pub(crate) async fn step(&self, state: SenderState) -> SenderState {
        match state {
            SenderState::Idle => SenderState::Idle,
            SenderState::Sending => self.send_head().await,
            SenderState::WaitingForNetwork => {
                tokio::time::sleep(self.config.network_retry_delay).await;
                SenderState::Sending
            }
            SenderState::WaitingAfterFailure => {
                tokio::time::sleep(self.config.failure_retry_delay).await;
                SenderState::Sending
            }
        }
    }

    async fn send_head(&self) -> SenderState {
        let Some(head) = self.queue.head_or_release() else {
            return SenderState::Idle;
        };

        if !self.network.is_reachable().await {
            SenderStats::bump(&self.stats.network_waits);
            debug!(
                delay_ms = self.config.network_retry_delay.as_millis() as u64,
                "Network unavailable, waiting"
            );
            return SenderState::WaitingForNetwork;
        }

        SenderStats::bump(&self.stats.attempts);
        match self.transmit(&head).await {
            Ok(()) => {
                self.queue.dequeue_head();
                SenderStats::bump(&self.stats.delivered);
                debug!(
                    event_type = %head.event_type,
                    remaining = self.queue.len(),
                    "Envelope delivered"
                );
                SenderState::Sending
            }
            Err(e) => {
                SenderStats::bump(&self.stats.failures);
                warn!(
                    event_type = %head.event_type,
                    event_key = head.event_key.as_deref().unwrap_or(""),
                    delay_ms = self.config.failure_retry_delay.as_millis() as u64,
                    error = %e,
                    "Send failed, retrying same envelope"
                );
                SenderState::WaitingAfterFailure
            }
        }
    }

    /// Attach the device context and hand the body to the transport.
    async fn transmit(&self, head: &Envelope) -> OutboxResult<()> {
        let body = EnrichedEnvelope::new(head, &self.context).to_body()?;
        self.transport.send(body).await
    }
}

/// Releases the sender slot if a run ends without draining the queue.
struct SenderSlot<'a> {
    queue: &'a DeliveryQueue,
    idle: &'a Notify,
    held: bool,
}

impl Drop for SenderSlot<'_> {
    fn drop(&mut self) {
        if self.held {
            self.queue.release_sender();
        }
        self.idle.notify_waiters();
    }
}
