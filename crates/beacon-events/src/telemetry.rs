//! Producer entry point.

use crate::GameEvent;
use beacon_outbox::{EnvelopeBuilder, Event, TelemetryLogger};
use std::sync::Arc;
use tracing::trace;

/// Handle producers use to record events.
///
/// Cheap to clone; every clone feeds the same logger.
#[derive(Clone)]
pub struct GameTelemetry {
    logger: Arc<TelemetryLogger>,
    builder: EnvelopeBuilder,
}

impl GameTelemetry {
    pub fn new(
        logger: Arc<TelemetryLogger>,
        game: impl Into<String>,
        player_id: impl Into<String>,
    ) -> Self {
        Self {
            logger,
            builder: EnvelopeBuilder::new(game, player_id),
        }
    }

    /// Record a game event. Never fails and never waits on the network.
    pub fn track(&self, event: GameEvent) {
        self.track_event(event.into());
    }

    /// Record an event built outside the [`GameEvent`] set.
    pub fn track_event(&self, event: Event) {
        trace!(event_type = event.event_type(), "Tracking event");
        self.logger.enqueue(self.builder.build(event));
    }

    pub fn logger(&self) -> &Arc<TelemetryLogger> {
        &self.logger
    }

    pub fn player_id(&self) -> &str {
        self.builder.player_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuestStatus;
    use async_trait::async_trait;
    use beacon_outbox::{
        AlwaysReachable, DeviceContext, KeyValueStore, MemoryKeyValue, OutboxResult,
        SenderConfig, Transport, DEFAULT_QUEUE_KEY,
    };
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct CollectingTransport {
        bodies: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Transport for CollectingTransport {
        async fn send(&self, body: Vec<u8>) -> OutboxResult<()> {
            self.bodies.lock().unwrap().push(serde_json::from_slice(&body)?);
            Ok(())
        }
    }

    fn telemetry(transport: Arc<CollectingTransport>) -> GameTelemetry {
        let store = KeyValueStore::new(MemoryKeyValue::new(), DEFAULT_QUEUE_KEY, 1024 * 1024);
        let logger = TelemetryLogger::new(
            Arc::new(store),
            transport,
            Arc::new(AlwaysReachable),
            DeviceContext::collect("1.2.3"),
            SenderConfig::default(),
        )
        .unwrap();
        GameTelemetry::new(Arc::new(logger), "ember-quest", "player-7")
    }

    #[tokio::test]
    async fn test_track_delivers_typed_events_in_order() {
        let transport = Arc::new(CollectingTransport::default());
        let telemetry = telemetry(transport.clone());

        telemetry.track(GameEvent::session_started("s-1"));
        telemetry.track(GameEvent::quest("q-1", QuestStatus::Completed));
        telemetry.track(GameEvent::map_entered("harbor"));

        assert!(telemetry
            .logger()
            .wait_until_drained(Duration::from_secs(5))
            .await);

        let bodies = transport.bodies.lock().unwrap().clone();
        let types: Vec<&str> = bodies
            .iter()
            .map(|b| b["eventType"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["session_start", "quest_completed", "map_enter"]);

        assert_eq!(bodies[1]["game"], "ember-quest");
        assert_eq!(bodies[1]["playerId"], "player-7");
        assert_eq!(bodies[1]["eventKey"], "quest_completed:q-1");
        assert_eq!(bodies[1]["data"]["questId"], "q-1");
        assert_eq!(bodies[1]["device"]["appVersion"], "1.2.3");
        assert!(bodies[2].get("eventKey").is_none());
    }

    #[tokio::test]
    async fn test_clones_share_logger() {
        let transport = Arc::new(CollectingTransport::default());
        let telemetry = telemetry(transport.clone());
        let other = telemetry.clone();

        other.track(GameEvent::achievement_unlocked("first-steps"));
        assert!(telemetry
            .logger()
            .wait_until_drained(Duration::from_secs(5))
            .await);
        assert_eq!(transport.bodies.lock().unwrap().len(), 1);
        assert_eq!(telemetry.player_id(), "player-7");
    }
}
