//! Themed worlds (portals). Each one scales quest rewards while it is the
//! active world; only one is active at a time.

use crate::game::errors::LifeVerseError;
use crate::game::reward::spend;
use crate::game::types::GameState;

pub const STARTING_WORLD_ID: &str = "terra";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldDefinition {
    pub id: &'static str,
    pub name: &'static str,
    /// Integer percent, 100 = no change
    pub xp_multiplier: u32,
    pub coin_multiplier: u32,
    pub unlock_level: u32,
    pub unlock_cost: u64,
}

pub const WORLDS: &[WorldDefinition] = &[
    WorldDefinition {
        id: STARTING_WORLD_ID,
        name: "Terra Commons",
        xp_multiplier: 100,
        coin_multiplier: 100,
        unlock_level: 1,
        unlock_cost: 0,
    },
    WorldDefinition {
        id: "aqua",
        name: "Aqua Depths",
        xp_multiplier: 125,
        coin_multiplier: 125,
        unlock_level: 5,
        unlock_cost: 500,
    },
    WorldDefinition {
        id: "ember",
        name: "Ember Peaks",
        xp_multiplier: 150,
        coin_multiplier: 150,
        unlock_level: 10,
        unlock_cost: 1500,
    },
    WorldDefinition {
        id: "nebula",
        name: "Nebula Spire",
        xp_multiplier: 200,
        coin_multiplier: 200,
        unlock_level: 20,
        unlock_cost: 5000,
    },
];

pub fn find_world(world_id: &str) -> Option<&'static WorldDefinition> {
    WORLDS.iter().find(|w| w.id == world_id)
}

/// Multipliers of the user's active world. An id missing from the catalog scales by 1x.
pub fn active_world(state: &GameState) -> Option<&'static WorldDefinition> {
    find_world(&state.user.active_world)
}

/// Apply a world's multipliers to a (xp, coins) pair, rounding down.
pub fn scale_reward(world: Option<&WorldDefinition>, xp: u64, coins: u64) -> (u64, u64) {
    match world {
        Some(w) => (
            xp.saturating_mul(w.xp_multiplier as u64) / 100,
            coins.saturating_mul(w.coin_multiplier as u64) / 100,
        ),
        None => (xp, coins),
    }
}

/// Pay for and unlock a world. Unlocking an already unlocked world is a no-op.
pub fn unlock_world(state: &mut GameState, world_id: &str) -> Result<bool, LifeVerseError> {
    let world = find_world(world_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("world: {}", world_id)))?;

    if state.user.unlocked_worlds.contains(world.id) {
        return Ok(false);
    }
    if state.user.level < world.unlock_level {
        return Err(LifeVerseError::LevelTooLow {
            required: world.unlock_level,
            current: state.user.level,
        });
    }

    spend(&mut state.user, world.unlock_cost)?;
    state.user.unlocked_worlds.insert(world.id.to_string());
    Ok(true)
}

pub fn set_active_world(state: &mut GameState, world_id: &str) -> Result<(), LifeVerseError> {
    if !state.user.unlocked_worlds.contains(world_id) {
        return Err(LifeVerseError::InvalidState(format!(
            "world {} is not unlocked",
            world_id
        )));
    }
    state.user.active_world = world_id.to_string();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;

    #[test]
    fn starting_world_is_neutral() {
        let world = find_world(STARTING_WORLD_ID);
        assert_eq!(scale_reward(world, 250, 25), (250, 25));
    }

    #[test]
    fn multipliers_round_down() {
        let aqua = find_world("aqua");
        assert_eq!(scale_reward(aqua, 50, 5), (62, 6));
    }

    #[test]
    fn unlock_requires_level_then_coins() {
        let mut state = initial_state("u1", "Ada");
        assert!(matches!(
            unlock_world(&mut state, "aqua"),
            Err(LifeVerseError::LevelTooLow { required: 5, current: 1 })
        ));

        state.user.level = 5;
        state.user.coins = 499;
        assert!(matches!(
            unlock_world(&mut state, "aqua"),
            Err(LifeVerseError::InsufficientFunds { .. })
        ));
        assert_eq!(state.user.coins, 499);

        state.user.coins = 600;
        assert!(unlock_world(&mut state, "aqua").unwrap());
        assert_eq!(state.user.coins, 100);
        assert!(!unlock_world(&mut state, "aqua").unwrap());
        assert_eq!(state.user.coins, 100);
    }

    #[test]
    fn only_unlocked_worlds_can_be_activated() {
        let mut state = initial_state("u1", "Ada");
        assert!(set_active_world(&mut state, "ember").is_err());
        assert_eq!(state.user.active_world, STARTING_WORLD_ID);

        state.user.unlocked_worlds.insert("ember".to_string());
        set_active_world(&mut state, "ember").unwrap();
        assert_eq!(state.user.active_world, "ember");
    }

    #[test]
    fn unknown_world_is_not_found() {
        let mut state = initial_state("u1", "Ada");
        assert!(matches!(
            unlock_world(&mut state, "atlantis"),
            Err(LifeVerseError::NotFound(_))
        ));
    }
}
