/// Level progression and coin balance math.
///
/// Everything here is pure except [`award`], which applies the same math to a
/// [`User`] in place.
use crate::game::errors::LifeVerseError;
use crate::game::types::User;

/// XP needed to advance from the base level.
pub const BASE_THRESHOLD: f64 = 100.0;
/// Growth factor of the threshold per level.
pub const THRESHOLD_GROWTH: f64 = 1.5;

/// Result of feeding XP into the level curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub xp: u64,
    pub level: u32,
    pub threshold: u64,
    pub levels_gained: u32,
}

/// `floor(100 * 1.5^(level-1))`; level 0 is treated as level 1.
pub fn xp_threshold_for_level(level: u32) -> u64 {
    let exponent = level.max(1) - 1;
    let raw = BASE_THRESHOLD * THRESHOLD_GROWTH.powi(exponent.min(i32::MAX as u32) as i32);
    // Float-to-int casts saturate, so enormous levels clamp to u64::MAX.
    (raw.floor() as u64).max(1)
}

/// Add `amount` XP and roll over as many level-ups as it pays for.
pub fn apply_xp(current_xp: u64, current_level: u32, current_threshold: u64, amount: u64) -> LevelProgress {
    let mut xp = current_xp.saturating_add(amount);
    let mut level = current_level.max(1);
    let mut threshold = current_threshold.max(1);
    let mut levels_gained = 0;

    while xp >= threshold {
        xp -= threshold;
        level = level.saturating_add(1);
        levels_gained += 1;
        threshold = xp_threshold_for_level(level);
    }

    LevelProgress {
        xp,
        level,
        threshold,
        levels_gained,
    }
}

/// Apply a signed coin delta, refusing to go below zero.
pub fn apply_coins(current_coins: u64, delta: i64) -> Result<u64, LifeVerseError> {
    if delta >= 0 {
        return Ok(current_coins.saturating_add(delta as u64));
    }
    let cost = delta.unsigned_abs();
    current_coins
        .checked_sub(cost)
        .ok_or(LifeVerseError::InsufficientFunds {
            needed: cost,
            available: current_coins,
        })
}

/// Spend `cost` coins from the user.
pub fn spend(user: &mut User, cost: u64) -> Result<(), LifeVerseError> {
    let delta = i64::try_from(cost).map_err(|_| LifeVerseError::InsufficientFunds {
        needed: cost,
        available: user.coins,
    })?;
    user.coins = apply_coins(user.coins, -delta)?;
    Ok(())
}

/// Grant XP and coins to the user, returning the number of levels gained.
pub fn award(user: &mut User, xp: u64, coins: u64) -> u32 {
    let progress = apply_xp(user.xp, user.level, user.xp_to_next_level, xp);
    user.xp = progress.xp;
    user.level = progress.level;
    user.xp_to_next_level = progress.threshold;
    user.coins = user.coins.saturating_add(coins);
    progress.levels_gained
}
