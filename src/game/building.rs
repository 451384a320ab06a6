use crate::game::errors::LifeVerseError;
use crate::game::reward::spend;
use crate::game::types::{Building, GameState};

pub const MAX_BUILDING_LEVEL: u32 = 10;

fn building_mut<'a>(
    state: &'a mut GameState,
    building_id: &str,
) -> Result<&'a mut Building, LifeVerseError> {
    state
        .buildings
        .iter_mut()
        .find(|b| b.id == building_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("building: {}", building_id)))
}

/// Cost of the next upgrade: the unlock cost times the current level.
pub fn upgrade_cost(building: &Building) -> u64 {
    building.unlock_cost.saturating_mul(building.level.max(1) as u64)
}

/// Unlock a locked building, charging its unlock cost. Leaves it at level 1.
pub fn unlock_building(state: &mut GameState, building_id: &str) -> Result<(), LifeVerseError> {
    let building = building_mut(state, building_id)?;
    if building.unlocked {
        return Err(LifeVerseError::InvalidState(format!(
            "building {} is already unlocked",
            building_id
        )));
    }
    let cost = building.unlock_cost;

    spend(&mut state.user, cost)?;
    let building = building_mut(state, building_id)?;
    building.unlocked = true;
    building.level = 1;
    Ok(())
}

/// Raise an unlocked building by one level. Returns the new level.
pub fn upgrade_building(state: &mut GameState, building_id: &str) -> Result<u32, LifeVerseError> {
    let building = building_mut(state, building_id)?;
    if !building.unlocked {
        return Err(LifeVerseError::InvalidState(format!(
            "building {} is locked",
            building_id
        )));
    }
    if building.level >= MAX_BUILDING_LEVEL {
        return Err(LifeVerseError::InvalidState(format!(
            "building {} is at max level",
            building_id
        )));
    }
    let cost = upgrade_cost(building);

    spend(&mut state.user, cost)?;
    let building = building_mut(state, building_id)?;
    building.level += 1;
    Ok(building.level)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;

    #[test]
    fn unlock_charges_and_sets_level_one() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = 150;
        unlock_building(&mut state, "gym").unwrap();

        let gym = state.building("gym").unwrap();
        assert!(gym.unlocked);
        assert_eq!(gym.level, 1);
        assert_eq!(state.user.coins, 50);
    }

    #[test]
    fn unlock_twice_is_rejected_without_charge() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = 500;
        unlock_building(&mut state, "gym").unwrap();
        assert!(unlock_building(&mut state, "gym").is_err());
        assert_eq!(state.user.coins, 400);
    }

    #[test]
    fn unaffordable_unlock_leaves_building_locked() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = 10;
        assert!(matches!(
            unlock_building(&mut state, "bank"),
            Err(LifeVerseError::InsufficientFunds { needed: 200, available: 10 })
        ));
        assert!(!state.building("bank").unwrap().unlocked);
    }

    #[test]
    fn upgrade_cost_scales_with_level() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = 1_000;
        assert!(upgrade_building(&mut state, "gym").is_err());

        unlock_building(&mut state, "gym").unwrap(); // 100
        assert_eq!(upgrade_building(&mut state, "gym").unwrap(), 2); // 100
        assert_eq!(upgrade_building(&mut state, "gym").unwrap(), 3); // 200
        assert_eq!(state.user.coins, 600);
    }
}
