//! Command implementations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use beacon_config_and_utils::{Config, Paths, StoreBackend};
use beacon_events::{GameEvent, GameTelemetry, PlayerIdentity};
use beacon_outbox::{
    DeliveryQueue, DeviceContext, DirectoryKeyValue, FileStore, HttpTransport, KeyValueStore,
    PersistentStore, SenderConfig, TcpProbe, TelemetryLogger, DEFAULT_QUEUE_KEY,
};
use serde_json::json;
use tracing::{info, warn};

/// Open the configured store backend.
pub fn open_store(config: &Config, paths: &Paths) -> Arc<dyn PersistentStore> {
    match config.store {
        StoreBackend::File => Arc::new(FileStore::new(paths.queue_file())),
        StoreBackend::Kv => Arc::new(KeyValueStore::new(
            DirectoryKeyValue::new(paths.kv_dir()),
            DEFAULT_QUEUE_KEY,
            config.kv_quota_bytes,
        )),
    }
}

/// Build the logger and resume delivery of anything already queued.
pub fn start_logger(config: &Config, paths: &Paths) -> anyhow::Result<Arc<TelemetryLogger>> {
    if config.api_key.is_empty() {
        warn!("No API key configured; the collector will likely reject envelopes");
    }

    let transport = HttpTransport::new(
        &config.server_url,
        &config.api_key,
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("Failed to create HTTP transport")?;
    let probe = TcpProbe::for_url(&config.server_url).context("Failed to create network probe")?;

    let logger = TelemetryLogger::new(
        open_store(config, paths),
        Arc::new(transport),
        Arc::new(probe),
        DeviceContext::collect(env!("CARGO_PKG_VERSION")),
        SenderConfig::default(),
    )
    .context("Failed to start telemetry logger")?;

    Ok(Arc::new(logger))
}

/// `beacon track`: queue one event and give it `wait` to be delivered.
pub async fn track(
    config: &Config,
    paths: &Paths,
    event: GameEvent,
    wait: Duration,
) -> anyhow::Result<()> {
    let identity = PlayerIdentity::load_or_create(&paths.player_id_file())
        .context("Failed to load player id")?;
    let logger = start_logger(config, paths)?;
    let telemetry = GameTelemetry::new(logger.clone(), config.game.clone(), identity.id());

    let event_type = event.event_type();
    telemetry.track(event);
    info!(event_type, player_id = telemetry.player_id(), "Event queued");

    if !logger.wait_until_drained(wait).await {
        // Still persisted; the next run delivers it.
        warn!(
            pending = logger.status().pending,
            "Delivery not confirmed before timeout"
        );
    }

    println!("{}", serde_json::to_string_pretty(&logger.status())?);
    Ok(())
}

/// `beacon status`: read the stored queue without starting a sender.
pub fn status(config: &Config, paths: &Paths) -> anyhow::Result<()> {
    let store = open_store(config, paths);
    let identity = store.identity();
    let queue = DeliveryQueue::new(store);
    let pending = queue.load_from_store();

    let report = json!({
        "store": identity,
        "pending": pending,
        "head": queue.peek_head(),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// `beacon drain`: deliver the stored queue, failing if it does not empty
/// within `timeout`.
pub async fn drain(config: &Config, paths: &Paths, timeout: Duration) -> anyhow::Result<()> {
    let logger = start_logger(config, paths)?;
    let start = logger.status();
    info!(pending = start.pending, "Draining queue");

    let drained = logger.wait_until_drained(timeout).await;
    let status = logger.status();
    println!("{}", serde_json::to_string_pretty(&status)?);

    if !drained {
        bail!(
            "{} envelope(s) still pending after {}s",
            status.pending,
            timeout.as_secs()
        );
    }
    Ok(())
}
