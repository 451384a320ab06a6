use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use rand::Rng;

use crate::api::{
    BuildingRecord, CreatureRecord, ProfileRecord, QuestRecord, RecordService, SledRecordService,
};
use crate::game::arena::{ArenaMode, BattleSession, TickOutcome, TickToken};
use crate::game::building;
use crate::game::clan;
use crate::game::creature;
use crate::game::errors::LifeVerseError;
use crate::game::finance::{self, BudgetSummary};
use crate::game::health;
use crate::game::quest::{self, QuestCompletion};
use crate::game::reward::{apply_coins, apply_xp, award, xp_threshold_for_level};
use crate::game::state::initial_state;
use crate::game::types::{
    Clan, Expense, GameState, HealthLog, HealthUpdate, Quest, SavingsGoal, STAT_CAP,
};
use crate::game::world;
use crate::storage::{
    decode_snapshot, encode_snapshot, MemoryBackend, SledBackend, SnapshotBackend, SNAPSHOT_KEY,
};

/// Where a corrupt snapshot is set aside before the seed replaces it.
pub const CORRUPT_SNAPSHOT_KEY: &str = "lifeverse-storage.corrupt";

pub const DEFAULT_USER_ID: &str = "player";
pub const DEFAULT_USER_NAME: &str = "Adventurer";

enum BackendSource {
    Path(PathBuf),
    Memory,
    Custom(Box<dyn SnapshotBackend>),
}

/// Builder so callers and tests can pick the backend and the seeded user.
pub struct GameStoreBuilder {
    source: BackendSource,
    user_id: String,
    user_name: String,
}

impl GameStoreBuilder {
    /// Sled database rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_source(BackendSource::Path(path.into()))
    }

    /// Process-local storage; nothing survives the process.
    pub fn in_memory() -> Self {
        Self::from_source(BackendSource::Memory)
    }

    pub fn with_backend(backend: Box<dyn SnapshotBackend>) -> Self {
        Self::from_source(BackendSource::Custom(backend))
    }

    fn from_source(source: BackendSource) -> Self {
        Self {
            source,
            user_id: DEFAULT_USER_ID.to_string(),
            user_name: DEFAULT_USER_NAME.to_string(),
        }
    }

    /// Identity used if the store has to seed a fresh state.
    pub fn user(mut self, user_id: &str, name: &str) -> Self {
        self.user_id = user_id.to_string();
        self.user_name = name.to_string();
        self
    }

    pub fn open(self) -> Result<GameStore, LifeVerseError> {
        let backend: Box<dyn SnapshotBackend> = match self.source {
            BackendSource::Path(path) => Box::new(SledBackend::open(path)?),
            BackendSource::Memory => Box::new(MemoryBackend::new()),
            BackendSource::Custom(backend) => backend,
        };
        GameStore::load(backend, &self.user_id, &self.user_name)
    }

    /// Open a sled-backed store together with a record service in the same database.
    pub fn open_with_records(self) -> Result<(GameStore, SledRecordService), LifeVerseError> {
        let BackendSource::Path(path) = self.source else {
            return Err(LifeVerseError::InvalidState(
                "local records need an on-disk store".to_string(),
            ));
        };
        std::fs::create_dir_all(&path)?;
        let db = sled::open(&path)?;
        let records = SledRecordService::open(&db)?;
        let backend = Box::new(SledBackend::from_db(db)?);
        let store = GameStore::load(backend, &self.user_id, &self.user_name)?;
        Ok((store, records))
    }
}

/// Single source of truth for one user's game.
///
/// Every action works on a copy of the state, persists the copy, and only then
/// swaps it in. A failed action or a failed save leaves [`GameStore::state`]
/// exactly as it was.
pub struct GameStore {
    state: GameState,
    arena: BattleSession,
    backend: Box<dyn SnapshotBackend>,
    seeded: bool,
}

impl GameStore {
    fn load(
        backend: Box<dyn SnapshotBackend>,
        user_id: &str,
        user_name: &str,
    ) -> Result<Self, LifeVerseError> {
        let loaded = match backend.load(SNAPSHOT_KEY) {
            Ok(Some(bytes)) => match decode_snapshot(&bytes) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!("saved game is unreadable ({}); starting from seed", e);
                    if let Err(e) = backend.save(CORRUPT_SNAPSHOT_KEY, &bytes) {
                        warn!("could not set aside corrupt snapshot: {}", e);
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("could not read saved game ({}); starting from seed", e);
                None
            }
        };

        let seeded = loaded.is_none();
        let state = match loaded {
            Some(mut state) => {
                normalize(&mut state);
                state
            }
            None => {
                info!("seeding new game for {}", user_id);
                initial_state(user_id, user_name)
            }
        };

        let store = Self {
            state,
            arena: BattleSession::default(),
            backend,
            seeded,
        };
        if seeded {
            store.persist(&store.state)?;
        }
        Ok(store)
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn arena(&self) -> &BattleSession {
        &self.arena
    }

    /// True when this store started from the seed rather than a saved game.
    pub fn was_seeded(&self) -> bool {
        self.seeded
    }

    fn persist(&self, state: &GameState) -> Result<(), LifeVerseError> {
        let bytes = encode_snapshot(state)?;
        self.backend.save(SNAPSHOT_KEY, &bytes)?;
        debug!("snapshot saved ({} bytes)", bytes.len());
        Ok(())
    }

    fn mutate<T, F>(&mut self, f: F) -> Result<T, LifeVerseError>
    where
        F: FnOnce(&mut GameState) -> Result<T, LifeVerseError>,
    {
        let mut working = self.state.clone();
        let out = f(&mut working)?;
        if working != self.state {
            self.persist(&working)?;
            self.state = working;
        }
        Ok(out)
    }

    // ---- quests -----------------------------------------------------------

    pub fn add_quest(&mut self, quest: Quest) -> Result<(), LifeVerseError> {
        self.mutate(|state| quest::add_quest(state, quest))
    }

    /// `Ok(None)` when the quest is unknown or already completed.
    pub fn complete_quest(&mut self, quest_id: &str) -> Result<Option<QuestCompletion>, LifeVerseError> {
        self.mutate(|state| Ok(quest::complete_quest(state, quest_id)))
    }

    pub fn advance_quest(
        &mut self,
        quest_id: &str,
        amount: u32,
    ) -> Result<Option<QuestCompletion>, LifeVerseError> {
        self.mutate(|state| quest::advance_quest(state, quest_id, amount))
    }

    pub fn reset_quest(&mut self, quest_id: &str) -> Result<(), LifeVerseError> {
        self.mutate(|state| quest::reset_quest(state, quest_id))
    }

    // ---- creatures --------------------------------------------------------

    /// Feed a creature for [`creature::FEED_COST`] coins. Returns the happiness gained.
    pub fn feed_creature(&mut self, creature_id: &str) -> Result<u32, LifeVerseError> {
        self.mutate(|state| creature::feed_creature(state, creature_id, Utc::now()))
    }

    // ---- city -------------------------------------------------------------

    pub fn unlock_building(&mut self, building_id: &str) -> Result<(), LifeVerseError> {
        self.mutate(|state| building::unlock_building(state, building_id))
    }

    pub fn upgrade_building(&mut self, building_id: &str) -> Result<u32, LifeVerseError> {
        self.mutate(|state| building::upgrade_building(state, building_id))
    }

    // ---- worlds -----------------------------------------------------------

    pub fn unlock_world(&mut self, world_id: &str) -> Result<bool, LifeVerseError> {
        self.mutate(|state| world::unlock_world(state, world_id))
    }

    pub fn set_active_world(&mut self, world_id: &str) -> Result<(), LifeVerseError> {
        self.mutate(|state| world::set_active_world(state, world_id))
    }

    // ---- finance ----------------------------------------------------------

    pub fn add_expense(&mut self, entry: Expense) -> Result<(), LifeVerseError> {
        self.mutate(|state| finance::add_expense(state, entry))
    }

    pub fn budget_summary(&self) -> BudgetSummary {
        finance::budget_summary(&self.state.expenses)
    }

    pub fn add_savings_goal(&mut self, goal: SavingsGoal) -> Result<(), LifeVerseError> {
        self.mutate(|state| finance::add_savings_goal(state, goal))
    }

    pub fn contribute_to_goal(&mut self, goal_id: &str, amount: i64) -> Result<bool, LifeVerseError> {
        self.mutate(|state| finance::contribute_to_goal(state, goal_id, amount))
    }

    // ---- health -----------------------------------------------------------

    pub fn log_health(&mut self, date: NaiveDate, update: &HealthUpdate) -> Result<HealthLog, LifeVerseError> {
        self.mutate(|state| health::log_health(state, date, update))
    }

    // ---- clan -------------------------------------------------------------

    pub fn join_clan(&mut self, clan_id: &str, name: &str) -> Result<(), LifeVerseError> {
        self.mutate(|state| clan::join_clan(state, clan_id, name))
    }

    pub fn leave_clan(&mut self) -> Result<Option<Clan>, LifeVerseError> {
        self.mutate(|state| Ok(clan::leave_clan(state)))
    }

    // ---- rewards ----------------------------------------------------------

    /// Grant XP and coins from outside the quest flow. Returns levels gained.
    pub fn award_bonus(&mut self, xp: u64, coins: u64) -> Result<u32, LifeVerseError> {
        self.mutate(|state| Ok(award(&mut state.user, xp, coins)))
    }

    /// Apply a signed coin delta; overdrafts are rejected.
    pub fn adjust_coins(&mut self, delta: i64) -> Result<u64, LifeVerseError> {
        self.mutate(|state| {
            state.user.coins = apply_coins(state.user.coins, delta)?;
            Ok(state.user.coins)
        })
    }

    /// Throw away all progress and start over from the seed.
    pub fn reset_to_seed(&mut self) -> Result<(), LifeVerseError> {
        let (user_id, name) = (self.state.user.id.clone(), self.state.user.name.clone());
        self.mutate(|state| {
            *state = initial_state(&user_id, &name);
            Ok(())
        })?;
        self.arena.reset();
        Ok(())
    }

    // ---- study arena ------------------------------------------------------

    pub fn arena_set_mode(&mut self, mode: ArenaMode) -> Result<(), LifeVerseError> {
        self.arena.set_mode(mode)
    }

    /// `None` if a battle is already under way; no second ticker should be spawned.
    pub fn arena_start(&mut self) -> Option<TickToken> {
        self.arena.start()
    }

    pub fn arena_pause(&mut self) -> bool {
        self.arena.pause()
    }

    pub fn arena_resume(&mut self) -> Option<TickToken> {
        self.arena.resume()
    }

    pub fn arena_reset(&mut self) {
        self.arena.reset();
    }

    /// Advance the battle by one second; pays out the reward on completion.
    ///
    /// If the reward cannot be saved the battle is paused on its last second,
    /// so resuming retries the payout.
    pub fn arena_tick<R: Rng + ?Sized>(
        &mut self,
        token: TickToken,
        rng: &mut R,
    ) -> Result<TickOutcome, LifeVerseError> {
        let mut session = self.arena.clone();
        let outcome = session.tick(token, rng);
        if let TickOutcome::Completed(reward) = outcome {
            let paid = self.mutate(|state| {
                award(&mut state.user, reward.xp, reward.coins);
                Ok(())
            });
            if let Err(e) = paid {
                self.arena.pause();
                warn!(
                    "arena reward could not be saved; battle paused with {}s left: {}",
                    self.arena.remaining_secs(),
                    e
                );
                return Err(e);
            }
        }
        self.arena = session;
        Ok(outcome)
    }

    // ---- record service sync ---------------------------------------------

    /// Complete a quest and push the changed records. Local state only changes
    /// if the service accepted every record.
    pub fn complete_quest_synced(
        &mut self,
        service: &dyn RecordService,
        quest_id: &str,
    ) -> Result<Option<QuestCompletion>, LifeVerseError> {
        self.mutate(|state| {
            let Some(done) = quest::complete_quest(state, quest_id) else {
                return Ok(None);
            };
            let user_id = state.user.id.clone();
            if let Some(q) = state.quest(quest_id) {
                service.save_quest(&QuestRecord::from_quest(&user_id, q))?;
            }
            for id in &done.creatures_boosted {
                if let Some(c) = state.creature(id) {
                    service.save_creature(&CreatureRecord::from_creature(&user_id, c))?;
                }
            }
            service.save_profile(&ProfileRecord::from_user(&state.user))?;
            Ok(Some(done))
        })
    }

    pub fn feed_creature_synced(
        &mut self,
        service: &dyn RecordService,
        creature_id: &str,
    ) -> Result<u32, LifeVerseError> {
        self.mutate(|state| {
            let gained = creature::feed_creature(state, creature_id, Utc::now())?;
            let user_id = state.user.id.clone();
            if let Some(c) = state.creature(creature_id) {
                service.save_creature(&CreatureRecord::from_creature(&user_id, c))?;
            }
            service.save_profile(&ProfileRecord::from_user(&state.user))?;
            Ok(gained)
        })
    }

    pub fn unlock_building_synced(
        &mut self,
        service: &dyn RecordService,
        building_id: &str,
    ) -> Result<(), LifeVerseError> {
        self.mutate(|state| {
            building::unlock_building(state, building_id)?;
            let user_id = state.user.id.clone();
            if let Some(b) = state.building(building_id) {
                service.save_building(&BuildingRecord::from_building(&user_id, b))?;
            }
            service.save_profile(&ProfileRecord::from_user(&state.user))?;
            Ok(())
        })
    }

    /// Merge the service's quest records into local state by id.
    /// Records with unknown enum values are skipped. Returns how many were applied.
    pub fn pull_quests(&mut self, service: &dyn RecordService) -> Result<usize, LifeVerseError> {
        let records = service.list_quests(&self.state.user.id)?;
        self.mutate(|state| {
            let mut applied = 0;
            for record in &records {
                let Some(remote) = record.to_quest() else {
                    warn!("skipping remote quest {} with unknown type/category", record.id);
                    continue;
                };
                match state.quests.iter_mut().find(|q| q.id == remote.id) {
                    Some(local) => {
                        local.title = remote.title;
                        local.category = remote.category;
                        local.quest_type = remote.quest_type;
                        local.xp_reward = remote.xp_reward;
                        local.coin_reward = remote.coin_reward;
                        local.completed = remote.completed;
                        local.streak = remote.streak;
                    }
                    None => state.quests.push(remote),
                }
                applied += 1;
            }
            Ok(applied)
        })
    }
}

/// Re-establish invariants on a state read from storage.
fn normalize(state: &mut GameState) {
    let user = &mut state.user;
    user.level = user.level.max(1);
    let progress = apply_xp(user.xp, user.level, xp_threshold_for_level(user.level), 0);
    user.xp = progress.xp;
    user.level = progress.level;
    user.xp_to_next_level = progress.threshold;
    if !user.unlocked_worlds.contains(&user.active_world) {
        user.unlocked_worlds.insert(user.active_world.clone());
    }
    for c in &mut state.creatures {
        c.happiness = c.happiness.min(STAT_CAP);
        c.evolution = c.evolution.min(STAT_CAP);
    }
}
