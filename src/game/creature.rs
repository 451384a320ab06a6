/// Creature nurture logic: feeding, quest-driven growth and evolution stages.
use chrono::{DateTime, Utc};

use crate::game::errors::LifeVerseError;
use crate::game::reward::spend;
use crate::game::types::{Creature, EvolutionStage, GameState, QuestType, STAT_CAP};

/// Coins charged per feeding.
pub const FEED_COST: u64 = 5;
pub const FEED_HAPPINESS: u32 = 10;
pub const QUEST_HAPPINESS: u32 = 5;
pub const QUEST_EVOLUTION: u32 = 2;

pub const TEEN_THRESHOLD: u32 = 33;
pub const ADULT_THRESHOLD: u32 = 66;

pub fn evolution_stage(evolution: u32) -> EvolutionStage {
    if evolution >= ADULT_THRESHOLD {
        EvolutionStage::Adult
    } else if evolution >= TEEN_THRESHOLD {
        EvolutionStage::Teen
    } else {
        EvolutionStage::Baby
    }
}

impl Creature {
    pub fn stage(&self) -> EvolutionStage {
        evolution_stage(self.evolution)
    }

    /// Feed the creature, returning the happiness actually gained.
    pub fn feed(&mut self, now: DateTime<Utc>) -> u32 {
        let before = self.happiness;
        self.happiness = (self.happiness + FEED_HAPPINESS).min(STAT_CAP);
        self.last_fed = Some(now);
        self.happiness - before
    }

    fn boost(&mut self) {
        self.happiness = (self.happiness + QUEST_HAPPINESS).min(STAT_CAP);
        self.evolution = (self.evolution + QUEST_EVOLUTION).min(STAT_CAP);
    }
}

/// Charge the feed cost and feed one creature.
///
/// Nothing changes when the creature is unknown or the user cannot pay.
pub fn feed_creature(
    state: &mut GameState,
    creature_id: &str,
    now: DateTime<Utc>,
) -> Result<u32, LifeVerseError> {
    let pos = state
        .creatures
        .iter()
        .position(|c| c.id == creature_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("creature: {}", creature_id)))?;

    spend(&mut state.user, FEED_COST)?;
    Ok(state.creatures[pos].feed(now))
}

/// Boost every creature matching the completed quest's domain.
/// Returns the ids of the creatures that were boosted.
pub fn on_quest_completed(creatures: &mut [Creature], quest_type: QuestType) -> Vec<String> {
    let target = quest_type.creature_type();
    creatures
        .iter_mut()
        .filter(|c| c.creature_type == target)
        .map(|c| {
            c.boost();
            c.id.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;
    use crate::game::types::CreatureType;

    #[test]
    fn stage_boundaries() {
        assert_eq!(evolution_stage(0), EvolutionStage::Baby);
        assert_eq!(evolution_stage(32), EvolutionStage::Baby);
        assert_eq!(evolution_stage(33), EvolutionStage::Teen);
        assert_eq!(evolution_stage(65), EvolutionStage::Teen);
        assert_eq!(evolution_stage(66), EvolutionStage::Adult);
        assert_eq!(evolution_stage(100), EvolutionStage::Adult);
    }

    #[test]
    fn repeated_feeding_caps_happiness() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = 1_000;
        state.creatures[0].happiness = 95;
        let id = state.creatures[0].id.clone();

        for _ in 0..20 {
            feed_creature(&mut state, &id, Utc::now()).unwrap();
        }

        assert_eq!(state.creatures[0].happiness, 100);
        assert_eq!(state.user.coins, 1_000 - 20 * FEED_COST);
        assert!(state.creatures[0].last_fed.is_some());
    }

    #[test]
    fn feeding_without_coins_is_rejected() {
        let mut state = initial_state("u1", "Ada");
        state.user.coins = FEED_COST - 1;
        let before = state.clone();

        let result = feed_creature(&mut state, "ignis", Utc::now());
        assert!(matches!(result, Err(LifeVerseError::InsufficientFunds { .. })));
        assert_eq!(state, before);
    }

    #[test]
    fn feeding_unknown_creature_costs_nothing() {
        let mut state = initial_state("u1", "Ada");
        let coins = state.user.coins;
        assert!(matches!(
            feed_creature(&mut state, "ghost", Utc::now()),
            Err(LifeVerseError::NotFound(_))
        ));
        assert_eq!(state.user.coins, coins);
    }

    #[test]
    fn quest_boost_only_touches_matching_type() {
        let mut creatures = vec![
            Creature::new("a", "A", CreatureType::Fitness).with_stats(40, 10),
            Creature::new("b", "B", CreatureType::Fitness).with_stats(98, 99),
            Creature::new("c", "C", CreatureType::Study).with_stats(40, 10),
        ];

        let boosted = on_quest_completed(&mut creatures, QuestType::Fitness);
        assert_eq!(boosted, vec!["a".to_string(), "b".to_string()]);
        assert_eq!((creatures[0].happiness, creatures[0].evolution), (45, 12));
        assert_eq!((creatures[1].happiness, creatures[1].evolution), (100, 100));
        assert_eq!((creatures[2].happiness, creatures[2].evolution), (40, 10));
    }

    #[test]
    fn habit_completion_boosts_mental_creature() {
        let mut creatures = vec![
            Creature::new("zen", "Zen", CreatureType::Mental).with_stats(50, 0),
        ];
        let boosted = on_quest_completed(&mut creatures, QuestType::Habit);
        assert_eq!(boosted, vec!["zen".to_string()]);
        assert_eq!(creatures[0].happiness, 55);
    }
}
