//! Delivery queue: the ordered, durable set of pending envelopes.

use crate::{Envelope, PersistentStore};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

/// State guarded by the queue lock.
#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<Envelope>,
    /// Set while a sender task owns the queue head.
    sender_active: bool,
    /// Set once the owning logger is dropped. Nothing is written after.
    closed: bool,
}

/// FIFO of envelopes awaiting delivery.
///
/// Every mutation happens under one lock and is persisted before the lock
/// is released, so the stored snapshot never reflects a partial mutation.
/// The same lock guards the single-sender flag.
pub struct DeliveryQueue {
    state: Mutex<QueueState>,
    store: Arc<dyn PersistentStore>,
}

impl DeliveryQueue {
    /// Create an empty queue backed by `store`. Nothing is loaded yet.
    pub fn new(store: Arc<dyn PersistentStore>) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            store,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // A producer panicking mid-call must not wedge delivery.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the queue contents with the stored snapshot.
    ///
    /// A missing or unreadable snapshot leaves the queue empty. Returns the
    /// number of envelopes loaded. Skipped while a sender owns the head,
    /// since its in-flight envelope must stay the head it dequeues.
    pub fn load_from_store(&self) -> usize {
        let mut state = self.lock();
        if state.sender_active {
            warn!(
                store = %self.store.identity(),
                pending = state.pending.len(),
                "Sender active, not reloading queue snapshot"
            );
            return state.pending.len();
        }
        state.pending.clear();

        let snapshot = match self.store.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(store = %self.store.identity(), "No stored queue snapshot");
                return 0;
            }
            Err(e) => {
                warn!(store = %self.store.identity(), error = %e, "Failed to read queue snapshot, starting empty");
                return 0;
            }
        };

        let parsed = snapshot
            .iter()
            .map(|entry| serde_json::from_str::<Envelope>(entry))
            .collect::<Result<VecDeque<_>, _>>();

        match parsed {
            Ok(pending) => {
                state.pending = pending;
                if !state.pending.is_empty() {
                    info!(count = state.pending.len(), "Recovered pending envelopes");
                }
                state.pending.len()
            }
            Err(e) => {
                warn!(
                    store = %self.store.identity(),
                    entries = snapshot.len(),
                    error = %e,
                    "Corrupt queue snapshot, starting empty"
                );
                0
            }
        }
    }

    /// Append an envelope and persist.
    ///
    /// Never fails from the caller's point of view: a failed save is logged
    /// and the in-memory queue stays authoritative. Returns `true` when the
    /// caller has claimed the sender and must start it.
    pub fn enqueue(&self, envelope: Envelope) -> bool {
        let mut state = self.lock();
        if state.closed {
            warn!(event_type = %envelope.event_type, "Queue closed, dropping envelope");
            return false;
        }
        debug!(event_type = %envelope.event_type, pending = state.pending.len() + 1, "Enqueued envelope");
        state.pending.push_back(envelope);
        self.persist(&state);
        Self::claim(&mut state)
    }

    /// Copy of the head envelope, if any.
    pub fn peek_head(&self) -> Option<Envelope> {
        self.lock().pending.front().cloned()
    }

    /// Remove the head and persist. No-op (logged) when already empty.
    pub fn dequeue_head(&self) -> Option<Envelope> {
        let mut state = self.lock();
        if state.closed {
            debug!("Queue closed, keeping stored head");
            return None;
        }
        let Some(head) = state.pending.pop_front() else {
            warn!("Dequeue requested on an empty queue");
            return None;
        };
        self.persist(&state);
        Some(head)
    }

    /// Number of pending envelopes.
    pub fn len(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Copy of all pending envelopes in delivery order.
    pub fn snapshot(&self) -> Vec<Envelope> {
        self.lock().pending.iter().cloned().collect()
    }

    /// Whether a sender currently owns the queue.
    pub fn is_sender_active(&self) -> bool {
        self.lock().sender_active
    }

    /// Claim the sender slot if work is pending and no sender runs.
    pub(crate) fn try_claim_sender(&self) -> bool {
        Self::claim(&mut self.lock())
    }

    /// Head for the sender; releases the sender slot when the queue is empty.
    ///
    /// Checking emptiness and clearing the flag under one lock means an
    /// enqueue racing with the sender going idle always starts a new one.
    pub(crate) fn head_or_release(&self) -> Option<Envelope> {
        let mut state = self.lock();
        match state.pending.front() {
            Some(head) if !state.closed => Some(head.clone()),
            _ => {
                state.sender_active = false;
                None
            }
        }
    }

    /// Release the sender slot unconditionally (sender task torn down).
    pub(crate) fn release_sender(&self) {
        self.lock().sender_active = false;
    }

    /// Stop writing to the store and stop handing out heads.
    ///
    /// Taking the lock waits out any save already in progress, so once this
    /// returns the store can be handed to another queue.
    pub(crate) fn close(&self) {
        self.lock().closed = true;
    }

    fn claim(state: &mut QueueState) -> bool {
        if state.closed || state.sender_active || state.pending.is_empty() {
            return false;
        }
        state.sender_active = true;
        true
    }

    /// Write the full snapshot. Must be called with the lock held.
    fn persist(&self, state: &QueueState) {
        if state.closed {
            return;
        }
        let snapshot = match state
            .pending
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to serialize queue snapshot");
                return;
            }
        };

        if let Err(e) = self.store.save(&snapshot) {
            error!(
                store = %self.store.identity(),
                pending = snapshot.len(),
                error = %e,
                "Failed to persist queue snapshot"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::harness::{envelope, RecordingStore};

    fn queue_with(store: &RecordingStore) -> DeliveryQueue {
        DeliveryQueue::new(Arc::new(store.clone()))
    }

    #[test]
    fn test_enqueue_appends_and_persists() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);

        queue.enqueue(envelope("a", 1));
        queue.enqueue(envelope("b", 2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek_head().unwrap().event_type, "a");
        assert_eq!(store.save_count(), 2);
        assert_eq!(store.latest_event_types(), vec!["a", "b"]);
    }

    #[test]
    fn test_first_enqueue_claims_sender_once() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);

        assert!(queue.enqueue(envelope("a", 1)));
        assert!(!queue.enqueue(envelope("b", 2)));
        assert!(queue.is_sender_active());
        assert!(!queue.try_claim_sender());
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        queue.enqueue(envelope("a", 1));

        let saves = store.save_count();
        for _ in 0..3 {
            assert_eq!(queue.peek_head().unwrap().event_type, "a");
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(store.save_count(), saves);
    }

    #[test]
    fn test_dequeue_removes_head_and_persists() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        queue.enqueue(envelope("a", 1));
        queue.enqueue(envelope("b", 2));

        let head = queue.dequeue_head().unwrap();
        assert_eq!(head.event_type, "a");
        assert_eq!(store.latest_event_types(), vec!["b"]);
    }

    #[test]
    fn test_dequeue_on_empty_is_noop() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);

        assert!(queue.dequeue_head().is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[test]
    fn test_head_or_release_clears_flag_only_when_empty() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        assert!(queue.enqueue(envelope("a", 1)));

        assert!(queue.head_or_release().is_some());
        assert!(queue.is_sender_active());

        queue.dequeue_head();
        assert!(queue.head_or_release().is_none());
        assert!(!queue.is_sender_active());

        // Next enqueue claims again
        assert!(queue.enqueue(envelope("b", 2)));
    }

    #[test]
    fn test_persistence_failure_keeps_memory_authoritative() {
        let store = RecordingStore::new();
        store.fail_saves(true);
        let queue = queue_with(&store);

        queue.enqueue(envelope("a", 1));
        queue.enqueue(envelope("b", 2));
        assert_eq!(queue.len(), 2);
        assert_eq!(store.save_count(), 0);

        // Next successful save reconciles
        store.fail_saves(false);
        queue.dequeue_head();
        assert_eq!(store.latest_event_types(), vec!["b"]);
    }

    #[test]
    fn test_load_replaces_contents_in_stored_order() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        queue.enqueue(envelope("stale", 0));
        queue.release_sender();

        store.preload(&[envelope("x", 1), envelope("y", 2), envelope("z", 3)]);
        assert_eq!(queue.load_from_store(), 3);

        let types: Vec<_> = queue.snapshot().into_iter().map(|e| e.event_type).collect();
        assert_eq!(types, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_load_skipped_while_sender_active() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        assert!(queue.enqueue(envelope("in-flight", 1)));

        store.preload(&[envelope("x", 2), envelope("y", 3)]);
        assert_eq!(queue.load_from_store(), 1);
        assert_eq!(queue.peek_head().unwrap().event_type, "in-flight");

        // The sender's dequeue still removes the envelope it transmitted
        assert_eq!(queue.dequeue_head().unwrap().event_type, "in-flight");
    }

    #[test]
    fn test_closed_queue_never_writes() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        assert!(queue.enqueue(envelope("a", 1)));
        queue.enqueue(envelope("b", 2));
        let saves = store.save_count();

        queue.close();
        assert!(queue.dequeue_head().is_none());
        assert!(!queue.enqueue(envelope("c", 3)));
        assert!(queue.head_or_release().is_none());
        assert!(!queue.is_sender_active());
        assert!(!queue.try_claim_sender());

        assert_eq!(store.save_count(), saves);
        assert_eq!(store.latest_event_types(), vec!["a", "b"]);
    }

    #[test]
    fn test_load_missing_snapshot_is_empty() {
        let store = RecordingStore::new();
        let queue = queue_with(&store);
        assert_eq!(queue.load_from_store(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_load_corrupt_snapshot_is_empty() {
        let store = RecordingStore::new();
        store.preload_raw(vec![
            serde_json::to_string(&envelope("ok", 1)).unwrap(),
            r#"{"eventType": 42}"#.to_string(),
        ]);
        let queue = queue_with(&store);

        assert_eq!(queue.load_from_store(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_load_read_failure_is_empty() {
        let store = RecordingStore::new();
        store.fail_loads(true);
        let queue = queue_with(&store);

        assert_eq!(queue.load_from_store(), 0);
        assert!(queue.is_empty());
    }
}
