//! LifeVerse game core: data model, reward rules, and the persisted store.
//!
//! Rules live in free functions over [`GameState`] so they can be tested
//! without storage. [`GameStore`] is the only thing that owns live state and
//! runs every rule as an all-or-nothing action.

pub mod arena;
pub mod building;
pub mod clan;
pub mod creature;
pub mod errors;
pub mod finance;
pub mod health;
pub mod quest;
pub mod reward;
pub mod state;
pub mod store;
pub mod ticker;
pub mod types;
pub mod world;

pub use arena::{ArenaMode, BattlePhase, BattleReward, BattleSession, TickOutcome, TickToken};
pub use creature::{evolution_stage, feed_creature, on_quest_completed, FEED_COST};
pub use errors::LifeVerseError;
pub use finance::{budget_summary, BudgetSummary};
pub use quest::{active_quests, completed_quests, QuestCompletion};
pub use reward::{apply_coins, apply_xp, award, xp_threshold_for_level, LevelProgress};
pub use state::{initial_state, STARTING_COINS};
pub use store::{GameStore, GameStoreBuilder};
pub use ticker::{ArenaTicker, SharedStore, DEFAULT_TICK_PERIOD};
pub use types::*;
pub use world::{find_world, WorldDefinition, STARTING_WORLD_ID, WORLDS};
