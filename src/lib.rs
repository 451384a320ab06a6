//! # LifeVerse - Gamified Productivity Core
//!
//! LifeVerse turns real-life habits into game progress. Completing quests
//! earns XP and coins, levels the player up, and grows the creature whose
//! domain matches the quest. Coins buy food for creatures, city buildings and
//! new worlds. A Pomodoro-style Study Arena pits a focus session against a boss.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lifeverse::game::GameStoreBuilder;
//!
//! fn main() -> Result<(), lifeverse::game::LifeVerseError> {
//!     let mut store = GameStoreBuilder::new("data/lifeverse").user("u1", "Ada").open()?;
//!     if let Some(done) = store.complete_quest("morning_workout")? {
//!         println!("+{} xp, level {}", done.xp_awarded, done.new_level);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - data model, reward/quest/creature/arena rules and the persisted store
//! - [`storage`] - snapshot envelope and key-value backends
//! - [`api`] - record service contract and its sled implementation
//! - [`validation`] - record payload checks with API error codes
//! - [`assistant`] - optional AI suggestions with an offline fallback
//! - [`config`] - TOML configuration
//! - [`logutil`] - log-safe rendering of user text

pub mod api;
pub mod assistant;
pub mod config;
pub mod game;
pub mod logutil;
pub mod storage;
pub mod validation;
