//! `beacon track` arguments, one subcommand per event kind.

use beacon_events::{CombatOutcome, GameEvent, InventoryChange, QuestStatus};
use clap::{Subcommand, ValueEnum};

#[derive(Subcommand, Debug)]
pub enum TrackCommand {
    /// A play session started
    SessionStart { session_id: String },
    /// A play session ended
    SessionEnd {
        session_id: String,
        duration_secs: u64,
    },
    /// The player picked a dialogue option
    Dialogue {
        npc_id: String,
        dialogue_id: String,
        choice_id: String,
    },
    /// The player discovered a zone for the first time
    MapDiscovered { zone_id: String },
    /// The player entered a zone
    MapEntered { zone_id: String },
    /// A quest changed status
    Quest {
        quest_id: String,
        #[arg(value_enum)]
        status: QuestStatusArg,
    },
    /// A combat encounter finished
    Combat {
        encounter_id: String,
        enemy_type: String,
        #[arg(value_enum)]
        outcome: CombatOutcomeArg,
        duration_ms: u64,
    },
    /// An inventory item changed
    Inventory {
        item_id: String,
        #[arg(value_enum)]
        change: InventoryChangeArg,
        #[arg(default_value = "1")]
        quantity: u32,
    },
    /// An achievement was unlocked
    Achievement { achievement_id: String },
    /// The client hit an error
    Error {
        message: String,
        /// Where the error happened
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum QuestStatusArg {
    Started,
    Completed,
    Failed,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CombatOutcomeArg {
    Victory,
    Defeat,
    Fled,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum InventoryChangeArg {
    Acquired,
    Consumed,
    Dropped,
}

impl From<QuestStatusArg> for QuestStatus {
    fn from(arg: QuestStatusArg) -> Self {
        match arg {
            QuestStatusArg::Started => QuestStatus::Started,
            QuestStatusArg::Completed => QuestStatus::Completed,
            QuestStatusArg::Failed => QuestStatus::Failed,
        }
    }
}

impl From<CombatOutcomeArg> for CombatOutcome {
    fn from(arg: CombatOutcomeArg) -> Self {
        match arg {
            CombatOutcomeArg::Victory => CombatOutcome::Victory,
            CombatOutcomeArg::Defeat => CombatOutcome::Defeat,
            CombatOutcomeArg::Fled => CombatOutcome::Fled,
        }
    }
}

impl From<InventoryChangeArg> for InventoryChange {
    fn from(arg: InventoryChangeArg) -> Self {
        match arg {
            InventoryChangeArg::Acquired => InventoryChange::Acquired,
            InventoryChangeArg::Consumed => InventoryChange::Consumed,
            InventoryChangeArg::Dropped => InventoryChange::Dropped,
        }
    }
}

impl From<TrackCommand> for GameEvent {
    fn from(command: TrackCommand) -> Self {
        match command {
            TrackCommand::SessionStart { session_id } => GameEvent::session_started(session_id),
            TrackCommand::SessionEnd {
                session_id,
                duration_secs,
            } => GameEvent::session_ended(session_id, duration_secs),
            TrackCommand::Dialogue {
                npc_id,
                dialogue_id,
                choice_id,
            } => GameEvent::dialogue_choice(npc_id, dialogue_id, choice_id),
            TrackCommand::MapDiscovered { zone_id } => GameEvent::map_discovered(zone_id),
            TrackCommand::MapEntered { zone_id } => GameEvent::map_entered(zone_id),
            TrackCommand::Quest { quest_id, status } => GameEvent::quest(quest_id, status.into()),
            TrackCommand::Combat {
                encounter_id,
                enemy_type,
                outcome,
                duration_ms,
            } => GameEvent::combat(encounter_id, enemy_type, outcome.into(), duration_ms),
            TrackCommand::Inventory {
                item_id,
                change,
                quantity,
            } => GameEvent::inventory(item_id, change.into(), quantity),
            TrackCommand::Achievement { achievement_id } => {
                GameEvent::achievement_unlocked(achievement_id)
            }
            TrackCommand::Error { message, context } => GameEvent::client_error(message, context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(subcommand)]
        event: TrackCommand,
    }

    fn parse(args: &[&str]) -> GameEvent {
        let mut argv = vec!["beacon-track"];
        argv.extend_from_slice(args);
        TestCli::try_parse_from(argv).unwrap().event.into()
    }

    #[test]
    fn test_quest_command() {
        let event = parse(&["quest", "q-9", "completed"]);
        assert_eq!(event, GameEvent::quest("q-9", QuestStatus::Completed));
    }

    #[test]
    fn test_inventory_default_quantity() {
        let event = parse(&["inventory", "potion", "acquired"]);
        assert_eq!(
            event,
            GameEvent::inventory("potion", InventoryChange::Acquired, 1)
        );
    }

    #[test]
    fn test_error_with_context() {
        let event = parse(&["error", "texture missing", "--context", "loader"]);
        assert_eq!(
            event,
            GameEvent::client_error("texture missing", Some("loader".to_string()))
        );
    }

    #[test]
    fn test_unknown_status_rejected() {
        assert!(TestCli::try_parse_from(["beacon-track", "quest", "q", "abandoned"]).is_err());
    }
}
