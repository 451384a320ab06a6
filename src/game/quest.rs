/// Quest lifecycle: adding quests, completing them exactly once and the
/// cascade into rewards, creatures and the daily counter.
use chrono::{DateTime, Utc};
use log::debug;

use crate::game::creature::on_quest_completed;
use crate::game::errors::LifeVerseError;
use crate::game::reward::award;
use crate::game::types::{GameState, Quest};
use crate::game::world::{active_world, scale_reward};
use crate::logutil::escape_log;

/// Summary of everything a single completion changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestCompletion {
    pub quest_id: String,
    pub xp_awarded: u64,
    pub coins_awarded: u64,
    pub levels_gained: u32,
    pub new_level: u32,
    pub streak: u32,
    pub creatures_boosted: Vec<String>,
}

/// Append a new, incomplete quest. Ids must be unique.
pub fn add_quest(state: &mut GameState, mut quest: Quest) -> Result<(), LifeVerseError> {
    if quest.id.trim().is_empty() {
        return Err(LifeVerseError::InvalidInput("quest id is empty".to_string()));
    }
    if state.quest(&quest.id).is_some() {
        return Err(LifeVerseError::DuplicateId(format!("quest: {}", quest.id)));
    }

    quest.completed = false;
    quest.streak = 0;
    quest.completed_at = None;
    if let (Some(max), Some(progress)) = (quest.max_progress, quest.progress.as_mut()) {
        *progress = (*progress).min(max);
    }

    debug!("quest added: {} ({})", quest.id, escape_log(&quest.title));
    state.quests.push(quest);
    Ok(())
}

/// Complete a quest now. See [`complete_quest_at`].
pub fn complete_quest(state: &mut GameState, quest_id: &str) -> Option<QuestCompletion> {
    complete_quest_at(state, quest_id, Utc::now())
}

/// Complete a quest, returning `None` when it is unknown or already completed.
pub fn complete_quest_at(
    state: &mut GameState,
    quest_id: &str,
    now: DateTime<Utc>,
) -> Option<QuestCompletion> {
    let pos = state
        .quests
        .iter()
        .position(|q| q.id == quest_id && q.is_active())?;

    let (xp, coins) = {
        let quest = &mut state.quests[pos];
        quest.completed = true;
        quest.completed_at = Some(now);
        quest.streak += 1;
        if let (Some(max), Some(progress)) = (quest.max_progress, quest.progress.as_mut()) {
            *progress = max;
        }
        (quest.xp_reward, quest.coin_reward)
    };

    let (xp, coins) = scale_reward(active_world(state), xp, coins);
    let levels_gained = award(&mut state.user, xp, coins);

    let quest_type = state.quests[pos].quest_type;
    let creatures_boosted = on_quest_completed(&mut state.creatures, quest_type);

    state.user.daily.record(now.date_naive());
    state.user.total_quests_completed += 1;

    let quest = &state.quests[pos];
    debug!(
        "quest completed: {} (+{} xp, +{} coins, streak {})",
        escape_log(&quest.title),
        xp,
        coins,
        quest.streak
    );

    Some(QuestCompletion {
        quest_id: quest.id.clone(),
        xp_awarded: xp,
        coins_awarded: coins,
        levels_gained,
        new_level: state.user.level,
        streak: quest.streak,
        creatures_boosted,
    })
}

/// Add progress to a quest with a `max_progress`. Reaching the maximum completes it.
pub fn advance_quest(
    state: &mut GameState,
    quest_id: &str,
    amount: u32,
) -> Result<Option<QuestCompletion>, LifeVerseError> {
    let quest = state
        .quests
        .iter_mut()
        .find(|q| q.id == quest_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("quest: {}", quest_id)))?;

    let Some(max) = quest.max_progress else {
        return Err(LifeVerseError::InvalidState(format!(
            "quest {} does not track progress",
            quest_id
        )));
    };
    if quest.completed {
        return Ok(None);
    }

    let progress = quest.progress.unwrap_or(0).saturating_add(amount).min(max);
    quest.progress = Some(progress);

    if progress >= max {
        Ok(complete_quest(state, quest_id))
    } else {
        Ok(None)
    }
}

/// Re-open a completed quest for the next period. The streak is kept.
pub fn reset_quest(state: &mut GameState, quest_id: &str) -> Result<(), LifeVerseError> {
    let quest = state
        .quests
        .iter_mut()
        .find(|q| q.id == quest_id)
        .ok_or_else(|| LifeVerseError::NotFound(format!("quest: {}", quest_id)))?;

    quest.completed = false;
    quest.completed_at = None;
    if quest.max_progress.is_some() {
        quest.progress = Some(0);
    }
    Ok(())
}

pub fn active_quests(state: &GameState) -> Vec<&Quest> {
    state.quests.iter().filter(|q| q.is_active()).collect()
}

pub fn completed_quests(state: &GameState) -> Vec<&Quest> {
    state.quests.iter().filter(|q| q.completed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;
    use crate::game::types::{CreatureType, QuestCategory, QuestType};

    fn fresh_state() -> GameState {
        let mut state = initial_state("u1", "Ada");
        state.quests.clear();
        state
    }

    #[test]
    fn completion_awards_once() {
        let mut state = fresh_state();
        add_quest(
            &mut state,
            Quest::new("q1", "Stretch", QuestCategory::Daily, QuestType::Fitness).with_rewards(40, 10),
        )
        .unwrap();
        let coins = state.user.coins;

        let first = complete_quest(&mut state, "q1").expect("first completion");
        assert_eq!(first.xp_awarded, 40);
        assert_eq!(first.streak, 1);

        assert!(complete_quest(&mut state, "q1").is_none());
        assert_eq!(state.user.xp, 40);
        assert_eq!(state.user.coins, coins + 10);
        assert_eq!(state.quest("q1").unwrap().streak, 1);
        assert_eq!(state.user.daily.quests_completed, 1);
        assert_eq!(state.user.total_quests_completed, 1);
    }

    #[test]
    fn missing_quest_is_a_no_op() {
        let mut state = fresh_state();
        let before = state.clone();
        assert!(complete_quest(&mut state, "nope").is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn big_reward_rolls_two_levels() {
        let mut state = fresh_state();
        add_quest(
            &mut state,
            Quest::new("boss", "Finish thesis", QuestCategory::Challenge, QuestType::Study)
                .with_rewards(250, 0),
        )
        .unwrap();

        let done = complete_quest(&mut state, "boss").unwrap();
        assert_eq!(done.levels_gained, 2);
        assert_eq!(state.user.level, 3);
        assert_eq!(state.user.xp, 0);
        assert_eq!(state.user.xp_to_next_level, 225);
    }

    #[test]
    fn fitness_completion_boosts_fitness_creatures_only() {
        let mut state = fresh_state();
        let before = state.creatures.clone();
        add_quest(
            &mut state,
            Quest::new("q1", "Run", QuestCategory::Daily, QuestType::Fitness),
        )
        .unwrap();
        complete_quest(&mut state, "q1").unwrap();

        for (old, new) in before.iter().zip(state.creatures.iter()) {
            if old.creature_type == CreatureType::Fitness {
                assert_eq!(new.happiness, old.happiness + 5);
                assert_eq!(new.evolution, old.evolution + 2);
            } else {
                assert_eq!(new, old);
            }
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut state = fresh_state();
        let quest = Quest::new("q1", "Run", QuestCategory::Daily, QuestType::Fitness);
        add_quest(&mut state, quest.clone()).unwrap();
        assert!(matches!(
            add_quest(&mut state, quest),
            Err(LifeVerseError::DuplicateId(_))
        ));
        assert_eq!(state.quests.len(), 1);
    }

    #[test]
    fn add_quest_normalises_lifecycle_fields() {
        let mut state = fresh_state();
        let mut quest = Quest::new("q1", "Run", QuestCategory::Daily, QuestType::Fitness);
        quest.completed = true;
        quest.streak = 9;
        add_quest(&mut state, quest).unwrap();

        let stored = state.quest("q1").unwrap();
        assert!(!stored.completed);
        assert_eq!(stored.streak, 0);
    }

    #[test]
    fn progress_completes_at_max() {
        let mut state = fresh_state();
        add_quest(
            &mut state,
            Quest::new("water", "Drink water", QuestCategory::Daily, QuestType::Habit)
                .with_rewards(20, 2)
                .with_max_progress(8),
        )
        .unwrap();

        assert!(advance_quest(&mut state, "water", 5).unwrap().is_none());
        assert_eq!(state.quest("water").unwrap().progress, Some(5));

        let done = advance_quest(&mut state, "water", 10).unwrap().expect("completed");
        assert_eq!(done.creatures_boosted, vec!["zen".to_string()]);
        assert_eq!(state.quest("water").unwrap().progress, Some(8));
        assert!(advance_quest(&mut state, "water", 1).unwrap().is_none());
    }

    #[test]
    fn reset_keeps_streak_and_allows_next_completion() {
        let mut state = fresh_state();
        add_quest(
            &mut state,
            Quest::new("q1", "Journal", QuestCategory::Daily, QuestType::Mental),
        )
        .unwrap();
        complete_quest(&mut state, "q1").unwrap();
        reset_quest(&mut state, "q1").unwrap();
        assert_eq!(active_quests(&state).len(), 1);

        let again = complete_quest(&mut state, "q1").unwrap();
        assert_eq!(again.streak, 2);
        assert_eq!(completed_quests(&state).len(), 1);
    }
}
