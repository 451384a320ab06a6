//! Canonical starting state for a new LifeVerse user.
//!
//! A fresh store, or one whose snapshot failed to load, starts from
//! [`initial_state`]: one level-1 user, three starter quests, one creature per
//! life domain and five locked city buildings.

use crate::game::types::{
    Building, BuildingType, Creature, CreatureType, GameState, Quest, QuestCategory, QuestType,
    User,
};
use crate::game::world::STARTING_WORLD_ID;

pub const STARTING_COINS: u64 = 100;

pub fn seed_user(user_id: &str, name: &str) -> User {
    User::new(user_id, name, STARTING_WORLD_ID).with_coins(STARTING_COINS)
}

pub fn seed_starter_quests() -> Vec<Quest> {
    vec![
        Quest::new(
            "morning_workout",
            "Morning Workout",
            QuestCategory::Daily,
            QuestType::Fitness,
        )
        .with_description("Complete 20 minutes of exercise before noon.")
        .with_rewards(50, 10),
        Quest::new(
            "read_chapter",
            "Read a Chapter",
            QuestCategory::Daily,
            QuestType::Study,
        )
        .with_description("Read one chapter of a non-fiction book.")
        .with_rewards(30, 5),
        Quest::new(
            "budget_review",
            "Weekly Budget Review",
            QuestCategory::Weekly,
            QuestType::Finance,
        )
        .with_description("Review this week's spending against your budget.")
        .with_rewards(100, 25),
    ]
}

pub fn seed_starter_creatures() -> Vec<Creature> {
    vec![
        Creature::new("ignis", "Ignis", CreatureType::Fitness),
        Creature::new("aurum", "Aurum", CreatureType::Finance),
        Creature::new("sage", "Sage", CreatureType::Study),
        Creature::new("zen", "Zen", CreatureType::Mental),
        Creature::new("chirp", "Chirp", CreatureType::Social),
    ]
}

pub fn seed_city_buildings() -> Vec<Building> {
    vec![
        Building::locked("gym", "Iron Gym", BuildingType::Gym, 100).at(0, 0),
        Building::locked("library", "Grand Library", BuildingType::Library, 150).at(1, 0),
        Building::locked("bank", "Coin Vault", BuildingType::Bank, 200).at(2, 0),
        Building::locked("zen_garden", "Zen Garden", BuildingType::ZenGarden, 120).at(0, 1),
        Building::locked(
            "community_hall",
            "Community Hall",
            BuildingType::CommunityHall,
            180,
        )
        .at(1, 1),
    ]
}

pub fn initial_state(user_id: &str, name: &str) -> GameState {
    GameState {
        user: seed_user(user_id, name),
        quests: seed_starter_quests(),
        creatures: seed_starter_creatures(),
        buildings: seed_city_buildings(),
        expenses: Vec::new(),
        health_logs: Vec::new(),
        clan: None,
        savings_goals: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_has_documented_shape() {
        let state = initial_state("u1", "Ada");
        assert_eq!(state.user.level, 1);
        assert_eq!(state.user.xp, 0);
        assert_eq!(state.user.xp_to_next_level, 100);
        assert_eq!(state.quests.len(), 3);
        assert_eq!(state.creatures.len(), 5);
        assert_eq!(state.buildings.len(), 5);
        assert!(state.buildings.iter().all(|b| !b.unlocked && b.level == 0));
        assert!(state.user.unlocked_worlds.contains(&state.user.active_world));
    }

    #[test]
    fn one_creature_per_domain() {
        let types: HashSet<_> = seed_starter_creatures()
            .into_iter()
            .map(|c| c.creature_type)
            .collect();
        assert_eq!(types.len(), CreatureType::ALL.len());
    }
}
