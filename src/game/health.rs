use chrono::NaiveDate;

use crate::game::errors::LifeVerseError;
use crate::game::types::{GameState, HealthLog, HealthUpdate};

pub const MIN_MOOD: u8 = 1;
pub const MAX_MOOD: u8 = 5;

/// Merge a partial update into the log for `date`, creating the log on first use.
pub fn log_health(
    state: &mut GameState,
    date: NaiveDate,
    update: &HealthUpdate,
) -> Result<HealthLog, LifeVerseError> {
    if let Some(sleep) = update.sleep {
        if !sleep.is_finite() || !(0.0..=24.0).contains(&sleep) {
            return Err(LifeVerseError::InvalidInput(format!(
                "sleep hours out of range: {}",
                sleep
            )));
        }
    }

    let pos = match state.health_logs.iter().position(|h| h.date == date) {
        Some(pos) => pos,
        None => {
            state.health_logs.push(HealthLog::empty(date));
            state.health_logs.len() - 1
        }
    };

    let log = &mut state.health_logs[pos];
    if let Some(water) = update.water {
        log.water = water;
    }
    if let Some(sleep) = update.sleep {
        log.sleep = sleep;
    }
    if let Some(steps) = update.steps {
        log.steps = steps;
    }
    if let Some(mood) = update.mood {
        log.mood = Some(mood.clamp(MIN_MOOD, MAX_MOOD));
    }
    if let Some(exercise) = update.exercise {
        log.exercise = exercise;
    }
    Ok(log.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, d).unwrap()
    }

    #[test]
    fn partial_updates_merge_into_one_log_per_day() {
        let mut state = initial_state("u1", "Ada");
        log_health(&mut state, day(1), &HealthUpdate { water: Some(3), ..Default::default() }).unwrap();
        log_health(&mut state, day(1), &HealthUpdate { steps: Some(8_000), mood: Some(9), ..Default::default() })
            .unwrap();
        log_health(&mut state, day(2), &HealthUpdate { sleep: Some(7.5), ..Default::default() }).unwrap();

        assert_eq!(state.health_logs.len(), 2);
        let first = state.health_log(day(1)).unwrap();
        assert_eq!(first.water, 3);
        assert_eq!(first.steps, 8_000);
        assert_eq!(first.mood, Some(5));
        assert_eq!(state.health_log(day(2)).unwrap().sleep, 7.5);
    }

    #[test]
    fn impossible_sleep_is_rejected() {
        let mut state = initial_state("u1", "Ada");
        let result = log_health(&mut state, day(1), &HealthUpdate { sleep: Some(30.0), ..Default::default() });
        assert!(result.is_err());
        assert!(state.health_logs.is_empty());
    }
}
