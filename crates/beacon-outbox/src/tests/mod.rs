//! Integration tests for the telemetry outbox.
//!
//! Test organization:
//!
//! - `harness.rs`    - Recording store, scripted transport and network probe
//! - `ordering.rs`   - Delivery order, online and offline
//! - `failures.rs`   - Transmission and persistence failures
//! - `recovery.rs`   - Restart from stored snapshots, one logger per store
//! - `concurrency.rs` - Producers on several threads, single sender
//! - `enrichment.rs` - Device context on the wire, never in storage

mod failures;
