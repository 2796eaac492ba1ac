//! Events, envelopes, and the builder that turns one into the other.

use crate::DeviceContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Event fields, kept in insertion order.
pub type EventData = Map<String, Value>;

/// A producer-defined event. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    data: EventData,
    idempotency_key: Option<String>,
}

impl Event {
    /// Create an event without an idempotency key.
    pub fn new(event_type: impl Into<String>, data: EventData) -> Self {
        Self {
            event_type: event_type.into(),
            data,
            idempotency_key: None,
        }
    }

    /// Attach an idempotency key the collector can deduplicate on.
    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &EventData {
        &self.data
    }

    pub fn idempotency_key(&self) -> Option<&str> {
        self.idempotency_key.as_deref()
    }
}

/// The unit stored in the delivery queue.
///
/// Carries identity fields and the event payload only; device context is
/// never part of an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub game: String,
    pub player_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_key: Option<String>,
    pub data: EventData,
}

/// Wire form of an envelope: the envelope fields plus `device`.
///
/// Built by the sender immediately before transmission and never stored.
#[derive(Debug, Serialize)]
pub struct EnrichedEnvelope<'a> {
    #[serde(flatten)]
    envelope: &'a Envelope,
    device: &'a DeviceContext,
}

impl<'a> EnrichedEnvelope<'a> {
    pub fn new(envelope: &'a Envelope, device: &'a DeviceContext) -> Self {
        Self { envelope, device }
    }

    /// Serialize to the JSON request body.
    pub fn to_body(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Wraps events into envelopes stamped with the game and player identity.
#[derive(Debug, Clone)]
pub struct EnvelopeBuilder {
    game: String,
    player_id: String,
}

impl EnvelopeBuilder {
    pub fn new(game: impl Into<String>, player_id: impl Into<String>) -> Self {
        Self {
            game: game.into(),
            player_id: player_id.into(),
        }
    }

    pub fn game(&self) -> &str {
        &self.game
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    /// Build an envelope timestamped now.
    pub fn build(&self, event: Event) -> Envelope {
        self.build_at(event, Utc::now())
    }

    /// Build an envelope with an explicit timestamp.
    pub fn build_at(&self, event: Event, timestamp: DateTime<Utc>) -> Envelope {
        Envelope {
            game: self.game.clone(),
            player_id: self.player_id.clone(),
            timestamp,
            event_type: event.event_type,
            event_key: event.idempotency_key,
            data: event.data,
        }
    }
}
