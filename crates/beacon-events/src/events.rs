//! Game event payloads.
//!
//! Each variant has its own required fields, so a producer cannot queue an
//! event with a missing or misspelled key. Payloads serialize to the
//! envelope `data` object in camelCase.

use beacon_outbox::{Event, EventData};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionAction {
    Start,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEvent {
    pub session_id: String,
    pub action: SessionAction,
    /// Only meaningful for `End`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueEvent {
    pub npc_id: String,
    pub dialogue_id: String,
    pub choice_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapAction {
    Discovered,
    Entered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapEvent {
    pub zone_id: String,
    pub action: MapAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Started,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestEvent {
    pub quest_id: String,
    pub status: QuestStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    Victory,
    Defeat,
    Fled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatEvent {
    pub encounter_id: String,
    pub enemy_type: String,
    pub outcome: CombatOutcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryChange {
    Acquired,
    Consumed,
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEvent {
    pub item_id: String,
    pub change: InventoryChange,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementEvent {
    pub achievement_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientErrorEvent {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// One telemetry event from the game client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Session(SessionEvent),
    Dialogue(DialogueEvent),
    Map(MapEvent),
    Quest(QuestEvent),
    Combat(CombatEvent),
    Inventory(InventoryEvent),
    Achievement(AchievementEvent),
    ClientError(ClientErrorEvent),
}

impl GameEvent {
    pub fn session_started(session_id: impl Into<String>) -> Self {
        Self::Session(SessionEvent {
            session_id: session_id.into(),
            action: SessionAction::Start,
            duration_secs: None,
        })
    }

    pub fn session_ended(session_id: impl Into<String>, duration_secs: u64) -> Self {
        Self::Session(SessionEvent {
            session_id: session_id.into(),
            action: SessionAction::End,
            duration_secs: Some(duration_secs),
        })
    }

    pub fn dialogue_choice(
        npc_id: impl Into<String>,
        dialogue_id: impl Into<String>,
        choice_id: impl Into<String>,
    ) -> Self {
        Self::Dialogue(DialogueEvent {
            npc_id: npc_id.into(),
            dialogue_id: dialogue_id.into(),
            choice_id: choice_id.into(),
        })
    }

    pub fn map_discovered(zone_id: impl Into<String>) -> Self {
        Self::Map(MapEvent {
            zone_id: zone_id.into(),
            action: MapAction::Discovered,
        })
    }

    pub fn map_entered(zone_id: impl Into<String>) -> Self {
        Self::Map(MapEvent {
            zone_id: zone_id.into(),
            action: MapAction::Entered,
        })
    }

    pub fn quest(quest_id: impl Into<String>, status: QuestStatus) -> Self {
        Self::Quest(QuestEvent {
            quest_id: quest_id.into(),
            status,
        })
    }

    pub fn combat(
        encounter_id: impl Into<String>,
        enemy_type: impl Into<String>,
        outcome: CombatOutcome,
        duration_ms: u64,
    ) -> Self {
        Self::Combat(CombatEvent {
            encounter_id: encounter_id.into(),
            enemy_type: enemy_type.into(),
            outcome,
            duration_ms,
        })
    }

    pub fn inventory(item_id: impl Into<String>, change: InventoryChange, quantity: u32) -> Self {
        Self::Inventory(InventoryEvent {
            item_id: item_id.into(),
            change,
            quantity,
        })
    }

    pub fn achievement_unlocked(achievement_id: impl Into<String>) -> Self {
        Self::Achievement(AchievementEvent {
            achievement_id: achievement_id.into(),
        })
    }

    pub fn client_error(message: impl Into<String>, context: Option<String>) -> Self {
        Self::ClientError(ClientErrorEvent {
            message: message.into(),
            context,
        })
    }

    /// Wire tag for the event.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Session(e) => match e.action {
                SessionAction::Start => "session_start",
                SessionAction::End => "session_end",
            },
            Self::Dialogue(_) => "dialogue_choice",
            Self::Map(e) => match e.action {
                MapAction::Discovered => "map_discovery",
                MapAction::Entered => "map_enter",
            },
            Self::Quest(e) => match e.status {
                QuestStatus::Started => "quest_started",
                QuestStatus::Completed => "quest_completed",
                QuestStatus::Failed => "quest_failed",
            },
            Self::Combat(_) => "combat_result",
            Self::Inventory(_) => "inventory_change",
            Self::Achievement(_) => "achievement_unlocked",
            Self::ClientError(_) => "client_error",
        }
    }

    /// `<event_type>:<entity id>` for events that happen once per entity.
    ///
    /// Repeatable events (dialogue, map entry, combat, inventory, errors)
    /// carry no key.
    pub fn idempotency_key(&self) -> Option<String> {
        let entity = match self {
            Self::Session(e) => &e.session_id,
            Self::Map(e) if e.action == MapAction::Discovered => &e.zone_id,
            Self::Quest(e) => &e.quest_id,
            Self::Achievement(e) => &e.achievement_id,
            _ => return None,
        };
        Some(format!("{}:{}", self.event_type(), entity))
    }

    fn payload(&self) -> serde_json::Result<Value> {
        match self {
            Self::Session(e) => serde_json::to_value(e),
            Self::Dialogue(e) => serde_json::to_value(e),
            Self::Map(e) => serde_json::to_value(e),
            Self::Quest(e) => serde_json::to_value(e),
            Self::Combat(e) => serde_json::to_value(e),
            Self::Inventory(e) => serde_json::to_value(e),
            Self::Achievement(e) => serde_json::to_value(e),
            Self::ClientError(e) => serde_json::to_value(e),
        }
    }

    /// Payload fields as envelope data.
    pub fn data(&self) -> EventData {
        match self.payload() {
            Ok(Value::Object(map)) => map,
            // Payloads are plain structs of strings, enums and integers
            _ => EventData::new(),
        }
    }
}

impl From<GameEvent> for Event {
    fn from(event: GameEvent) -> Self {
        let built = Event::new(event.event_type(), event.data());
        match event.idempotency_key() {
            Some(key) => built.with_idempotency_key(key),
            None => built,
        }
    }
}
