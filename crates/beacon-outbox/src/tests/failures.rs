//! Failure handling tests.
//!
//! Covered:
//! - A failed send waits the failure delay and retries the same head
//! - A failing head blocks everything behind it
//! - Persistence failures never reach producers or stop delivery

use super::harness::{
    envelope, logger_over, logger_with, MockNetwork, MockTransport, RecordingStore,
};
use crate::{
    KeyValueBackend, KeyValueStore, MemoryKeyValue, SenderConfig, DEFAULT_QUEUE_KEY,
    FAILURE_RETRY_DELAY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn failed_send_retries_same_head_after_delay() {
    let store = RecordingStore::new();
    let transport = Arc::new(MockTransport::new());
    transport.fail_next(1);
    let logger = logger_with(&store, transport.clone(), Arc::new(MockNetwork::online()));

    let start = Instant::now();
    logger.enqueue(envelope("a", 1));
    assert!(logger.wait_until_drained(Duration::from_secs(60)).await);

    let elapsed = start.elapsed();
    assert!(elapsed >= FAILURE_RETRY_DELAY, "retried after {:?}", elapsed);
    assert!(elapsed < FAILURE_RETRY_DELAY + Duration::from_secs(1));

    assert_eq!(transport.attempted_event_types(), vec!["a", "a"]);
    assert_eq!(transport.delivered_event_types(), vec!["a"]);

    // One save for the enqueue, one for the single dequeue
    assert_eq!(store.save_count(), 2);
    assert!(store.history()[1].is_empty());

    let status = logger.status();
    assert_eq!(status.failures, 1);
    assert_eq!(status.delivered, 1);
}

#[tokio::test(start_paused = true)]
async fn failing_head_blocks_later_envelopes() {
    let store = RecordingStore::new();
    let transport = Arc::new(MockTransport::new());
    transport.fail_next(3);
    let logger = logger_with(&store, transport.clone(), Arc::new(MockNetwork::online()));

    logger.enqueue(envelope("a", 1));
    logger.enqueue(envelope("b", 2));
    assert!(logger.wait_until_drained(Duration::from_secs(120)).await);

    assert_eq!(
        transport.attempted_event_types(),
        vec!["a", "a", "a", "a", "b"]
    );
    assert_eq!(transport.delivered_event_types(), vec!["a", "b"]);
    assert_eq!(logger.status().failures, 3);
}

#[tokio::test(start_paused = true)]
async fn permanently_failing_head_is_never_dropped() {
    let store = RecordingStore::new();
    let transport = Arc::new(MockTransport::new());
    transport.fail_next(1_000);
    let logger = logger_with(&store, transport.clone(), Arc::new(MockNetwork::online()));

    logger.enqueue(envelope("a", 1));
    logger.enqueue(envelope("b", 2));

    tokio::time::sleep(Duration::from_secs(300)).await;

    assert!(transport.delivered().is_empty());
    assert!(transport
        .attempted_event_types()
        .iter()
        .all(|event_type| event_type == "a"));
    assert_eq!(logger.queue().len(), 2);
    assert_eq!(store.latest_event_types(), vec!["a", "b"]);
    assert!(logger.status().failures >= 30);
}

#[tokio::test]
async fn persistence_failure_does_not_stop_delivery() {
    let store = RecordingStore::new();
    store.fail_saves(true);
    let transport = Arc::new(MockTransport::new());
    let logger = logger_with(&store, transport.clone(), Arc::new(MockNetwork::online()));

    logger.enqueue(envelope("a", 1));
    logger.enqueue(envelope("b", 2));

    assert!(logger.wait_until_drained(Duration::from_secs(5)).await);
    assert_eq!(transport.delivered_event_types(), vec!["a", "b"]);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn quota_exceeded_keeps_envelopes_in_memory() {
    let store = KeyValueStore::new(MemoryKeyValue::new(), DEFAULT_QUEUE_KEY, 16);
    let backend = store.backend().clone();
    let transport = Arc::new(MockTransport::new());
    let logger = logger_over(
        Arc::new(store),
        transport.clone(),
        Arc::new(MockNetwork::online()),
        SenderConfig::default(),
    );

    logger.enqueue(envelope("a", 1));
    logger.enqueue(envelope("b", 2));

    assert!(logger.wait_until_drained(Duration::from_secs(5)).await);
    assert_eq!(transport.delivered_event_types(), vec!["a", "b"]);

    // Only the final empty snapshot fits
    assert_eq!(backend.get(DEFAULT_QUEUE_KEY).unwrap().as_deref(), Some("[]"));
}
