//! Outbox pattern implementation for reliable telemetry delivery.
//!
//! This crate provides:
//! - DeliveryQueue: In-memory FIFO of envelopes, persisted on every mutation
//! - Sender: Single background task draining the queue with fixed-delay retry
//! - PersistentStore: Snapshot storage with file and key-value backends
//! - TelemetryLogger: The one live instance tying queue, store and sender together
//!
//! Envelopes are stored without device context. The sender attaches the
//! process-wide [`DeviceContext`] only when building the request body, so
//! persisted snapshots stay small and never carry enrichment.

mod context;
mod envelope;
mod error;
mod logger;
mod network;
mod queue;
mod sender;
mod store;
mod transport;

#[cfg(test)]
mod tests;

pub use context::DeviceContext;
pub use envelope::{EnrichedEnvelope, Envelope, EnvelopeBuilder, Event, EventData};
pub use error::{OutboxError, OutboxResult};
pub use logger::{DeliveryStatus, TelemetryLogger};
pub use network::{AlwaysReachable, NetworkProbe, TcpProbe};
pub use queue::DeliveryQueue;
pub use sender::{
    Sender, SenderConfig, SenderState, FAILURE_RETRY_DELAY, NETWORK_RETRY_DELAY,
};
pub use store::{
    DirectoryKeyValue, FileStore, KeyValueBackend, KeyValueStore, MemoryKeyValue,
    PersistentStore, DEFAULT_QUEUE_KEY,
};
pub use transport::{HttpTransport, Transport};
