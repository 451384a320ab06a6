//! Study Arena: a Pomodoro timer dressed up as a boss fight.
//!
//! [`BattleSession`] is a pure step machine. Something external (the tokio
//! [`ArenaTicker`](crate::game::ticker::ArenaTicker) in production, a plain
//! loop in tests) calls [`BattleSession::tick`] once per second with the
//! [`TickToken`] it was handed by `start`/`resume`. Pausing or resetting bumps
//! the session generation, so ticks carrying an old token are ignored and can
//! never mutate a session the caller no longer drives.
//!
//! ```text
//! Idle --start--> Running <--pause/resume--> Paused
//!                    |
//!              remaining == 0
//!                    v
//!                Completed --reset--> Idle
//! ```

use log::{debug, info};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::errors::LifeVerseError;

pub const BOSS_MAX_HP: u32 = 100;
pub const PLAYER_MAX_HP: u32 = 100;
/// A hit lands every this many elapsed seconds.
pub const HIT_INTERVAL_SECS: u32 = 30;
pub const MIN_DAMAGE: u32 = 5;
pub const MAX_DAMAGE: u32 = 14;
pub const DAMAGE_BONUS_XP: u64 = 2;
pub const DEFEAT_BONUS_XP: u64 = 150;
pub const DEFEAT_BONUS_COINS: u64 = 75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ArenaMode {
    Short,
    #[default]
    Pomodoro,
    Long,
}

impl ArenaMode {
    pub fn minutes(&self) -> u32 {
        match self {
            ArenaMode::Short => 15,
            ArenaMode::Pomodoro => 25,
            ArenaMode::Long => 45,
        }
    }

    pub fn duration_secs(&self) -> u32 {
        self.minutes() * 60
    }

    pub fn base_xp(&self) -> u64 {
        match self {
            ArenaMode::Short => 50,
            ArenaMode::Pomodoro => 100,
            ArenaMode::Long => 200,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" | "15" => Some(ArenaMode::Short),
            "pomodoro" | "25" => Some(ArenaMode::Pomodoro),
            "long" | "45" => Some(ArenaMode::Long),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BattlePhase {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Proof that the holder may drive the session's current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickToken {
    generation: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BattleReward {
    pub xp: u64,
    pub coins: u64,
    pub total_damage: u32,
    pub boss_defeated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale token or session not running; nothing changed.
    Ignored,
    /// One second elapsed; `hit` carries the damage if a hit landed.
    Advanced { remaining_secs: u32, hit: Option<u32> },
    /// The timer ran out on this tick.
    Completed(BattleReward),
}

/// Payout for a finished session.
pub fn battle_reward(mode: ArenaMode, total_damage: u32, boss_defeated: bool) -> BattleReward {
    let mut xp = mode.base_xp() + DAMAGE_BONUS_XP * total_damage as u64;
    let mut coins = xp / 2;
    if boss_defeated {
        xp += DEFEAT_BONUS_XP;
        coins += DEFEAT_BONUS_COINS;
    }
    BattleReward {
        xp,
        coins,
        total_damage,
        boss_defeated,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattleSession {
    mode: ArenaMode,
    phase: BattlePhase,
    remaining_secs: u32,
    elapsed_secs: u32,
    boss_hp: u32,
    player_hp: u32,
    hit_streak: u32,
    total_damage: u32,
    /// Set when boss HP hit zero before the timer ran out.
    boss_defeated: bool,
    generation: u64,
    last_reward: Option<BattleReward>,
}

impl Default for BattleSession {
    fn default() -> Self {
        Self::new(ArenaMode::default())
    }
}

impl BattleSession {
    pub fn new(mode: ArenaMode) -> Self {
        Self {
            mode,
            phase: BattlePhase::Idle,
            remaining_secs: mode.duration_secs(),
            elapsed_secs: 0,
            boss_hp: BOSS_MAX_HP,
            player_hp: PLAYER_MAX_HP,
            hit_streak: 0,
            total_damage: 0,
            boss_defeated: false,
            generation: 0,
            last_reward: None,
        }
    }

    pub fn mode(&self) -> ArenaMode {
        self.mode
    }

    pub fn phase(&self) -> BattlePhase {
        self.phase
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn boss_hp(&self) -> u32 {
        self.boss_hp
    }

    pub fn player_hp(&self) -> u32 {
        self.player_hp
    }

    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    pub fn total_damage(&self) -> u32 {
        self.total_damage
    }

    pub fn boss_defeated(&self) -> bool {
        self.boss_defeated
    }

    pub fn last_reward(&self) -> Option<BattleReward> {
        self.last_reward
    }

    pub fn is_running(&self) -> bool {
        self.phase == BattlePhase::Running
    }

    /// Whether `token` still drives this session.
    pub fn is_current(&self, token: TickToken) -> bool {
        self.phase == BattlePhase::Running && token.generation == self.generation
    }

    /// Choose the session length. Only allowed before a run starts or after it finished.
    pub fn set_mode(&mut self, mode: ArenaMode) -> Result<(), LifeVerseError> {
        match self.phase {
            BattlePhase::Idle | BattlePhase::Completed => {
                let generation = self.generation + 1;
                *self = Self::new(mode);
                self.generation = generation;
                Ok(())
            }
            BattlePhase::Running | BattlePhase::Paused => Err(LifeVerseError::InvalidState(
                "cannot change arena mode during a battle".to_string(),
            )),
        }
    }

    /// Begin a run from Idle. Any other phase returns `None`, so a second start
    /// never produces a second token.
    pub fn start(&mut self) -> Option<TickToken> {
        if self.phase != BattlePhase::Idle {
            return None;
        }
        self.phase = BattlePhase::Running;
        self.generation += 1;
        info!("arena battle started ({} min)", self.mode.minutes());
        Some(self.token())
    }

    /// Suspend the run. Outstanding tokens stop working.
    pub fn pause(&mut self) -> bool {
        if self.phase != BattlePhase::Running {
            return false;
        }
        self.phase = BattlePhase::Paused;
        self.generation += 1;
        debug!("arena paused with {}s remaining", self.remaining_secs);
        true
    }

    /// Continue a paused run with a fresh token.
    pub fn resume(&mut self) -> Option<TickToken> {
        if self.phase != BattlePhase::Paused {
            return None;
        }
        self.phase = BattlePhase::Running;
        self.generation += 1;
        Some(self.token())
    }

    /// Abandon the session without a reward and return to Idle.
    pub fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self::new(self.mode);
        self.generation = generation;
        debug!("arena reset");
    }

    fn token(&self) -> TickToken {
        TickToken {
            generation: self.generation,
        }
    }

    /// Advance the timer by one second.
    pub fn tick<R: Rng + ?Sized>(&mut self, token: TickToken, rng: &mut R) -> TickOutcome {
        if !self.is_current(token) || self.remaining_secs == 0 {
            return TickOutcome::Ignored;
        }

        self.remaining_secs -= 1;
        self.elapsed_secs += 1;

        let hit = if self.elapsed_secs % HIT_INTERVAL_SECS == 0 {
            let damage = rng.gen_range(MIN_DAMAGE..=MAX_DAMAGE);
            self.land_hit(damage);
            Some(damage)
        } else {
            None
        };

        if self.remaining_secs > 0 {
            return TickOutcome::Advanced {
                remaining_secs: self.remaining_secs,
                hit,
            };
        }

        self.phase = BattlePhase::Completed;
        self.generation += 1;
        let reward = battle_reward(self.mode, self.total_damage, self.boss_defeated);
        self.last_reward = Some(reward);
        info!(
            "arena battle complete: {} damage, boss defeated: {}, +{} xp +{} coins",
            self.total_damage, self.boss_defeated, reward.xp, reward.coins
        );
        TickOutcome::Completed(reward)
    }

    fn land_hit(&mut self, damage: u32) {
        self.boss_hp = self.boss_hp.saturating_sub(damage);
        self.total_damage += damage;
        self.hit_streak += 1;
        if self.boss_hp == 0 {
            self.boss_defeated = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn run_to_end(session: &mut BattleSession, token: TickToken, rng: &mut StdRng) -> BattleReward {
        loop {
            match session.tick(token, rng) {
                TickOutcome::Completed(reward) => return reward,
                TickOutcome::Advanced { .. } => {}
                TickOutcome::Ignored => panic!("tick ignored mid-run"),
            }
        }
    }

    #[test]
    fn modes_map_to_durations_and_base_xp() {
        assert_eq!(ArenaMode::Short.duration_secs(), 900);
        assert_eq!(ArenaMode::Pomodoro.duration_secs(), 1500);
        assert_eq!(ArenaMode::Long.duration_secs(), 2700);
        assert_eq!(
            [ArenaMode::Short, ArenaMode::Pomodoro, ArenaMode::Long].map(|m| m.base_xp()),
            [50, 100, 200]
        );
        assert_eq!(ArenaMode::parse("25"), Some(ArenaMode::Pomodoro));
    }

    #[test]
    fn pomodoro_without_damage_pays_base() {
        let reward = battle_reward(ArenaMode::Pomodoro, 0, false);
        assert_eq!((reward.xp, reward.coins), (100, 50));
    }

    #[test]
    fn damage_and_defeat_bonuses() {
        let reward = battle_reward(ArenaMode::Short, 101, true);
        // 50 + 202 = 252, coins 126, then +150/+75
        assert_eq!((reward.xp, reward.coins), (402, 201));
    }

    #[test]
    fn full_run_lands_a_hit_every_thirty_seconds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut session = BattleSession::new(ArenaMode::Pomodoro);
        let token = session.start().unwrap();

        let reward = run_to_end(&mut session, token, &mut rng);

        assert_eq!(session.phase(), BattlePhase::Completed);
        assert_eq!(session.hit_streak(), 50);
        assert!(session.total_damage() >= 50 * MIN_DAMAGE);
        assert!(session.total_damage() <= 50 * MAX_DAMAGE);
        // 50 hits of at least 5 always beat a 100 HP boss.
        assert_eq!(session.boss_hp(), 0);
        assert!(reward.boss_defeated);
        assert_eq!(reward, battle_reward(ArenaMode::Pomodoro, session.total_damage(), true));
        assert_eq!(session.last_reward(), Some(reward));
    }

    #[test]
    fn hits_only_land_on_interval() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = BattleSession::new(ArenaMode::Short);
        let token = session.start().unwrap();

        for _ in 0..29 {
            assert!(matches!(session.tick(token, &mut rng), TickOutcome::Advanced { hit: None, .. }));
        }
        match session.tick(token, &mut rng) {
            TickOutcome::Advanced { hit: Some(d), remaining_secs } => {
                assert!((MIN_DAMAGE..=MAX_DAMAGE).contains(&d));
                assert_eq!(remaining_secs, 900 - 30);
                assert_eq!(session.boss_hp(), BOSS_MAX_HP - d);
            }
            other => panic!("expected a hit, got {:?}", other),
        }
    }

    #[test]
    fn second_start_issues_no_token() {
        let mut session = BattleSession::default();
        assert!(session.start().is_some());
        assert!(session.start().is_none());
    }

    #[test]
    fn mode_locked_while_running_or_paused() {
        let mut session = BattleSession::new(ArenaMode::Short);
        session.start().unwrap();
        assert!(session.set_mode(ArenaMode::Long).is_err());
        session.pause();
        assert!(session.set_mode(ArenaMode::Long).is_err());
        session.reset();
        session.set_mode(ArenaMode::Long).unwrap();
        assert_eq!(session.remaining_secs(), 2700);
    }

    #[test]
    fn reset_restores_counters_and_kills_old_token() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut session = BattleSession::new(ArenaMode::Pomodoro);
        let token = session.start().unwrap();
        for _ in 0..95 {
            session.tick(token, &mut rng);
        }
        assert!(session.boss_hp() < BOSS_MAX_HP);

        session.reset();
        let snapshot = session.clone();
        assert_eq!(session.phase(), BattlePhase::Idle);
        assert_eq!(session.boss_hp(), BOSS_MAX_HP);
        assert_eq!(session.player_hp(), PLAYER_MAX_HP);
        assert_eq!(session.hit_streak(), 0);
        assert_eq!(session.total_damage(), 0);

        for _ in 0..120 {
            assert_eq!(session.tick(token, &mut rng), TickOutcome::Ignored);
        }
        assert_eq!(session, snapshot);

        // Even a new run does not revive the old token.
        let fresh = session.start().unwrap();
        assert_ne!(fresh, token);
        assert_eq!(session.tick(token, &mut rng), TickOutcome::Ignored);
    }

    #[test]
    fn pause_freezes_time_until_resume() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = BattleSession::new(ArenaMode::Short);
        let token = session.start().unwrap();
        session.tick(token, &mut rng);
        assert!(session.pause());

        assert_eq!(session.tick(token, &mut rng), TickOutcome::Ignored);
        assert_eq!(session.remaining_secs(), 899);

        let resumed = session.resume().unwrap();
        assert_eq!(session.tick(token, &mut rng), TickOutcome::Ignored);
        assert!(matches!(session.tick(resumed, &mut rng), TickOutcome::Advanced { remaining_secs: 898, .. }));
    }

    #[test]
    fn completed_session_needs_reset_before_restart() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut session = BattleSession::new(ArenaMode::Short);
        let token = session.start().unwrap();
        run_to_end(&mut session, token, &mut rng);

        assert!(session.start().is_none());
        assert_eq!(session.tick(token, &mut rng), TickOutcome::Ignored);
        session.reset();
        assert!(session.start().is_some());
    }
}
