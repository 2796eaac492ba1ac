//! Telemetry logger: the live instance owning one store's queue and sender.

use crate::sender::SenderStats;
use crate::{
    DeliveryQueue, DeviceContext, Envelope, NetworkProbe, OutboxError, OutboxResult,
    PersistentStore, Sender, SenderConfig, Transport,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Point-in-time view of delivery progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryStatus {
    /// Envelopes still queued, including the one in flight.
    pub pending: usize,
    /// Whether a sender task currently owns the queue.
    pub sending: bool,
    pub attempts: u64,
    pub delivered: u64,
    pub failures: u64,
    pub network_waits: u64,
    /// Number of sender runs started by this logger.
    pub sender_runs: u64,
}

/// Accepts envelopes from any thread and delivers them in order.
///
/// Only one logger may be live per store identity in a process. Dropping
/// the logger closes its queue, stops its sender and then releases the
/// claim, so a sender still finishing a send never writes to a store that
/// a newer logger owns.
pub struct TelemetryLogger {
    queue: Arc<DeliveryQueue>,
    sender: Sender,
    runtime: Handle,
    task: Mutex<Option<JoinHandle<()>>>,
    // Declared last: released only after `drop` has closed the queue.
    _claim: StoreClaim,
}

impl TelemetryLogger {
    /// Create the logger, recover the stored queue and resume delivery.
    ///
    /// Must be called from within a Tokio runtime; the sender is spawned on
    /// that runtime for the lifetime of the logger.
    pub fn new(
        store: Arc<dyn PersistentStore>,
        transport: Arc<dyn Transport>,
        network: Arc<dyn NetworkProbe>,
        context: DeviceContext,
        config: SenderConfig,
    ) -> OutboxResult<Self> {
        let runtime = Handle::try_current().map_err(|_| OutboxError::NoRuntime)?;
        let identity = store.identity();
        let claim = StoreClaim::acquire(identity.clone())?;

        let queue = Arc::new(DeliveryQueue::new(store));
        let recovered = queue.load_from_store();
        let sender = Sender::new(queue.clone(), transport, network, Arc::new(context), config);

        let logger = Self {
            queue,
            sender,
            runtime,
            task: Mutex::new(None),
            _claim: claim,
        };

        info!(store = %identity, recovered, "Telemetry logger started");

        if logger.queue.try_claim_sender() {
            logger.spawn_sender();
        }

        Ok(logger)
    }

    /// Queue an envelope for delivery. Never blocks on the network.
    pub fn enqueue(&self, envelope: Envelope) {
        if self.queue.enqueue(envelope) {
            self.spawn_sender();
        }
    }

    /// The underlying queue.
    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn status(&self) -> DeliveryStatus {
        let stats = self.sender.stats();
        DeliveryStatus {
            pending: self.queue.len(),
            sending: self.queue.is_sender_active(),
            attempts: SenderStats::get(&stats.attempts),
            delivered: SenderStats::get(&stats.delivered),
            failures: SenderStats::get(&stats.failures),
            network_waits: SenderStats::get(&stats.network_waits),
            sender_runs: SenderStats::get(&stats.runs),
        }
    }

    /// Wait until the queue is empty and the sender has gone idle.
    ///
    /// Returns `false` if `timeout` elapses first.
    pub async fn wait_until_drained(&self, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.sender.idle_signal().notified();
            tokio::pin!(notified);
            // Register before checking so a run ending in between is seen.
            notified.as_mut().enable();

            if self.is_drained() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.is_drained();
            }
        }
    }

    fn is_drained(&self) -> bool {
        self.queue.is_empty() && !self.queue.is_sender_active()
    }

    /// Start a sender run. The caller must have claimed the sender slot.
    fn spawn_sender(&self) {
        debug!(pending = self.queue.len(), "Spawning sender");
        let handle = self.runtime.spawn(self.sender.clone().run());
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        *task = Some(handle);
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        self.queue.close();
        let task = self.task.get_mut().unwrap_or_else(|p| p.into_inner());
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

fn live_stores() -> &'static Mutex<HashSet<String>> {
    static LIVE: OnceLock<Mutex<HashSet<String>>> = OnceLock::new();
    LIVE.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Process-wide claim on a store identity.
struct StoreClaim {
    identity: String,
}

impl StoreClaim {
    fn acquire(identity: String) -> OutboxResult<Self> {
        let mut live = live_stores().lock().unwrap_or_else(|p| p.into_inner());
        if !live.insert(identity.clone()) {
            return Err(OutboxError::AlreadyRunning(identity));
        }
        Ok(Self { identity })
    }
}

impl Drop for StoreClaim {
    fn drop(&mut self) {
        let mut live = live_stores().lock().unwrap_or_else(|p| p.into_inner());
        live.remove(&self.identity);
    }
}
