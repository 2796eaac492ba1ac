//! Typed game events for beacon telemetry.
//!
//! Producers build a [`GameEvent`] with one of its constructors and hand it
//! to [`GameTelemetry::track`], which stamps it into an envelope and queues
//! it on the shared [`beacon_outbox::TelemetryLogger`].

mod error;
mod events;
mod identity;
mod telemetry;

pub use error::{EventsError, EventsResult};
pub use events::{
    AchievementEvent, ClientErrorEvent, CombatEvent, CombatOutcome, DialogueEvent, GameEvent,
    InventoryChange, InventoryEvent, MapAction, MapEvent, QuestEvent, QuestStatus, SessionAction,
    SessionEvent,
};
pub use identity::PlayerIdentity;
pub use telemetry::GameTelemetry;
