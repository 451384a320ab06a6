//! # Record Service
//!
//! The persistence/API collaborator the game store syncs with. Records are
//! keyed by `user_id` and validated by [`crate::validation`] before they are
//! written. Errors carry a stable [`ApiErrorCode`] plus the HTTP status a web
//! front end would answer with.
//!
//! Field naming follows the remote API rather than the in-memory model. A
//! quest's wire `type` is its repeat period (`daily`/`weekly`/`challenge`) and
//! its wire `category` is the life domain.
//!
//! [`SledRecordService`] is the embedded implementation. It stores bincode
//! values in its own sled tree under `<kind>:<user_id>:<id>` keys.

use std::fmt;

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game::types::{
    Building, BuildingType, Creature, CreatureType, Quest, QuestCategory, QuestType, SavingsGoal,
    User,
};
use crate::validation::{
    require_user_id, validate_achievement, validate_building, validate_creature, validate_profile,
    validate_quest, validate_savings_goal, KEY_SEPARATOR,
};

const TREE_RECORDS: &str = "lifeverse_records";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    MissingUserId,
    MissingField,
    InvalidType,
    InvalidCategory,
    InvalidValue,
    Unauthorized,
    NotFound,
    PersistenceFailure,
}

impl ApiErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiErrorCode::MissingUserId => "MISSING_USER_ID",
            ApiErrorCode::MissingField => "MISSING_FIELD",
            ApiErrorCode::InvalidType => "INVALID_TYPE",
            ApiErrorCode::InvalidCategory => "INVALID_CATEGORY",
            ApiErrorCode::InvalidValue => "INVALID_VALUE",
            ApiErrorCode::Unauthorized => "UNAUTHORIZED",
            ApiErrorCode::NotFound => "NOT_FOUND",
            ApiErrorCode::PersistenceFailure => "PERSISTENCE_FAILURE",
        }
    }

    /// HTTP status the code is reported with.
    pub fn status(&self) -> u16 {
        match self {
            ApiErrorCode::MissingUserId
            | ApiErrorCode::MissingField
            | ApiErrorCode::InvalidType
            | ApiErrorCode::InvalidCategory
            | ApiErrorCode::InvalidValue => 400,
            ApiErrorCode::Unauthorized => 401,
            ApiErrorCode::NotFound => 404,
            ApiErrorCode::PersistenceFailure => 500,
        }
    }
}

impl fmt::Display for ApiErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} ({}): {}", .code, .code.status(), .message)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> u16 {
        self.code.status()
    }

    /// 5xx errors carry a generic message; the detail only goes to the log.
    fn persistence<E: fmt::Display>(detail: E) -> Self {
        warn!("record service persistence failure: {}", detail);
        Self::new(ApiErrorCode::PersistenceFailure, "internal storage error")
    }
}

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestRecord {
    pub user_id: String,
    pub id: String,
    pub title: String,
    /// daily | weekly | challenge
    #[serde(rename = "type")]
    pub quest_type: String,
    /// habit | study | fitness | finance | social | mental
    pub category: String,
    pub xp_reward: u64,
    pub coin_reward: u64,
    pub completed: bool,
    pub streak: u32,
}

impl QuestRecord {
    pub fn from_quest(user_id: &str, quest: &Quest) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: quest.id.clone(),
            title: quest.title.clone(),
            quest_type: quest.category.as_str().to_string(),
            category: quest.quest_type.as_str().to_string(),
            xp_reward: quest.xp_reward,
            coin_reward: quest.coin_reward,
            completed: quest.completed,
            streak: quest.streak,
        }
    }

    /// Convert back into the game model. `None` when an enum value is unknown.
    pub fn to_quest(&self) -> Option<Quest> {
        let category = QuestCategory::parse(&self.quest_type)?;
        let quest_type = QuestType::parse(&self.category)?;
        let mut quest = Quest::new(&self.id, &self.title, category, quest_type)
            .with_rewards(self.xp_reward, self.coin_reward);
        quest.completed = self.completed;
        quest.streak = self.streak;
        Some(quest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatureRecord {
    pub user_id: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub level: u32,
    pub happiness: u32,
    pub evolution: u32,
}

impl CreatureRecord {
    pub fn from_creature(user_id: &str, creature: &Creature) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: creature.id.clone(),
            name: creature.name.clone(),
            creature_type: creature.creature_type.as_str().to_string(),
            level: creature.level,
            happiness: creature.happiness,
            evolution: creature.evolution,
        }
    }

    pub fn creature_type(&self) -> Option<CreatureType> {
        CreatureType::parse(&self.creature_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildingRecord {
    pub user_id: String,
    pub id: String,
    #[serde(rename = "type")]
    pub building_type: String,
    pub level: u32,
    pub unlocked: bool,
}

impl BuildingRecord {
    pub fn from_building(user_id: &str, building: &Building) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: building.id.clone(),
            building_type: building.building_type.as_str().to_string(),
            level: building.level,
            unlocked: building.unlocked,
        }
    }

    pub fn building_type(&self) -> Option<BuildingType> {
        BuildingType::parse(&self.building_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileRecord {
    pub user_id: String,
    pub name: String,
    pub level: u32,
    pub xp: u64,
    pub coins: u64,
    pub active_world: String,
}

impl ProfileRecord {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            level: user.level,
            xp: user.xp,
            coins: user.coins,
            active_world: user.active_world.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SavingsGoalRecord {
    pub user_id: String,
    pub id: String,
    pub name: String,
    pub target: i64,
    pub saved: i64,
}

impl SavingsGoalRecord {
    pub fn from_goal(user_id: &str, goal: &SavingsGoal) -> Self {
        Self {
            user_id: user_id.to_string(),
            id: goal.id.clone(),
            name: goal.name.clone(),
            target: goal.target,
            saved: goal.saved,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AchievementRecord {
    pub user_id: String,
    pub id: String,
    pub title: String,
    pub category: String,
    pub unlocked: bool,
}

// ============================================================================
// Service
// ============================================================================

/// CRUD collaborator keyed by user id. Any error means nothing was written.
pub trait RecordService {
    fn save_quest(&self, record: &QuestRecord) -> Result<(), ApiError>;
    fn list_quests(&self, user_id: &str) -> Result<Vec<QuestRecord>, ApiError>;
    fn delete_quest(&self, user_id: &str, quest_id: &str) -> Result<(), ApiError>;

    fn save_creature(&self, record: &CreatureRecord) -> Result<(), ApiError>;
    fn list_creatures(&self, user_id: &str) -> Result<Vec<CreatureRecord>, ApiError>;

    fn save_building(&self, record: &BuildingRecord) -> Result<(), ApiError>;
    fn list_buildings(&self, user_id: &str) -> Result<Vec<BuildingRecord>, ApiError>;

    fn save_profile(&self, record: &ProfileRecord) -> Result<(), ApiError>;
    fn get_profile(&self, user_id: &str) -> Result<ProfileRecord, ApiError>;

    fn save_savings_goal(&self, record: &SavingsGoalRecord) -> Result<(), ApiError>;
    fn list_savings_goals(&self, user_id: &str) -> Result<Vec<SavingsGoalRecord>, ApiError>;

    fn save_achievement(&self, record: &AchievementRecord) -> Result<(), ApiError>;
    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementRecord>, ApiError>;
}

/// Sled-backed [`RecordService`].
pub struct SledRecordService {
    records: sled::Tree,
}

impl SledRecordService {
    pub fn open(db: &sled::Db) -> Result<Self, sled::Error> {
        Ok(Self {
            records: db.open_tree(TREE_RECORDS)?,
        })
    }

    // `user_id` must have passed `require_user_id`, so the separator after it
    // ends the owner segment and a prefix scan only sees that user's records.
    fn key(kind: &str, user_id: &str, id: &str) -> Vec<u8> {
        format!("{kind}{sep}{user_id}{sep}{id}", sep = KEY_SEPARATOR).into_bytes()
    }

    fn prefix(kind: &str, user_id: &str) -> Vec<u8> {
        format!("{kind}{sep}{user_id}{sep}", sep = KEY_SEPARATOR).into_bytes()
    }

    fn put<T: Serialize>(&self, kind: &str, user_id: &str, id: &str, value: &T) -> Result<(), ApiError> {
        let bytes = bincode::serialize(value).map_err(ApiError::persistence)?;
        self.records
            .insert(Self::key(kind, user_id, id), bytes)
            .map_err(ApiError::persistence)?;
        self.records.flush().map_err(ApiError::persistence)?;
        debug!("record saved: {}:{}:{}", kind, user_id, id);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, kind: &str, user_id: &str, id: &str) -> Result<T, ApiError> {
        let Some(bytes) = self
            .records
            .get(Self::key(kind, user_id, id))
            .map_err(ApiError::persistence)?
        else {
            return Err(ApiError::new(
                ApiErrorCode::NotFound,
                format!("{} {} not found", kind, id),
            ));
        };
        bincode::deserialize(&bytes).map_err(ApiError::persistence)
    }

    fn list<T: DeserializeOwned>(&self, kind: &str, user_id: &str) -> Result<Vec<T>, ApiError> {
        require_user_id(user_id)?;
        let mut out = Vec::new();
        for entry in self.records.scan_prefix(Self::prefix(kind, user_id)) {
            let (_, bytes) = entry.map_err(ApiError::persistence)?;
            out.push(bincode::deserialize(&bytes).map_err(ApiError::persistence)?);
        }
        Ok(out)
    }
}

impl RecordService for SledRecordService {
    fn save_quest(&self, record: &QuestRecord) -> Result<(), ApiError> {
        validate_quest(record)?;
        self.put("quests", &record.user_id, &record.id, record)
    }

    fn list_quests(&self, user_id: &str) -> Result<Vec<QuestRecord>, ApiError> {
        self.list("quests", user_id)
    }

    fn delete_quest(&self, user_id: &str, quest_id: &str) -> Result<(), ApiError> {
        require_user_id(user_id)?;
        let removed = self
            .records
            .remove(Self::key("quests", user_id, quest_id))
            .map_err(ApiError::persistence)?;
        if removed.is_none() {
            return Err(ApiError::new(
                ApiErrorCode::NotFound,
                format!("quest {} not found", quest_id),
            ));
        }
        self.records.flush().map_err(ApiError::persistence)?;
        Ok(())
    }

    fn save_creature(&self, record: &CreatureRecord) -> Result<(), ApiError> {
        validate_creature(record)?;
        self.put("creatures", &record.user_id, &record.id, record)
    }

    fn list_creatures(&self, user_id: &str) -> Result<Vec<CreatureRecord>, ApiError> {
        self.list("creatures", user_id)
    }

    fn save_building(&self, record: &BuildingRecord) -> Result<(), ApiError> {
        validate_building(record)?;
        self.put("buildings", &record.user_id, &record.id, record)
    }

    fn list_buildings(&self, user_id: &str) -> Result<Vec<BuildingRecord>, ApiError> {
        self.list("buildings", user_id)
    }

    fn save_profile(&self, record: &ProfileRecord) -> Result<(), ApiError> {
        validate_profile(record)?;
        self.put("profiles", &record.user_id, "profile", record)
    }

    fn get_profile(&self, user_id: &str) -> Result<ProfileRecord, ApiError> {
        require_user_id(user_id)?;
        self.get("profiles", user_id, "profile")
    }

    fn save_savings_goal(&self, record: &SavingsGoalRecord) -> Result<(), ApiError> {
        validate_savings_goal(record)?;
        self.put("savings", &record.user_id, &record.id, record)
    }

    fn list_savings_goals(&self, user_id: &str) -> Result<Vec<SavingsGoalRecord>, ApiError> {
        self.list("savings", user_id)
    }

    fn save_achievement(&self, record: &AchievementRecord) -> Result<(), ApiError> {
        validate_achievement(record)?;
        self.put("achievements", &record.user_id, &record.id, record)
    }

    fn list_achievements(&self, user_id: &str) -> Result<Vec<AchievementRecord>, ApiError> {
        self.list("achievements", user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;
    use tempfile::TempDir;

    fn service() -> (TempDir, SledRecordService) {
        let dir = TempDir::new().expect("tempdir");
        let db = sled::open(dir.path()).expect("sled");
        let service = SledRecordService::open(&db).expect("service");
        (dir, service)
    }

    #[test]
    fn error_codes_map_to_statuses() {
        assert_eq!(ApiErrorCode::MissingUserId.status(), 400);
        assert_eq!(ApiErrorCode::Unauthorized.status(), 401);
        assert_eq!(ApiErrorCode::NotFound.status(), 404);
        assert_eq!(ApiErrorCode::PersistenceFailure.status(), 500);
        let err = ApiError::new(ApiErrorCode::InvalidType, "type must be one of daily");
        assert_eq!(err.to_string(), "INVALID_TYPE (400): type must be one of daily");
    }

    #[test]
    fn error_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ApiErrorCode::MissingUserId).unwrap();
        assert_eq!(json, "\"MISSING_USER_ID\"");
    }

    #[test]
    fn quest_records_round_trip_through_game_model() {
        let state = initial_state("u1", "Ada");
        let record = QuestRecord::from_quest("u1", &state.quests[2]);
        assert_eq!(record.quest_type, "weekly");
        assert_eq!(record.category, "finance");
        let back = record.to_quest().unwrap();
        assert_eq!(back.category, state.quests[2].category);
        assert_eq!(back.quest_type, state.quests[2].quest_type);
    }

    #[test]
    fn records_are_scoped_per_user() {
        let (_dir, service) = service();
        let state = initial_state("u1", "Ada");
        for quest in &state.quests {
            service.save_quest(&QuestRecord::from_quest("u1", quest)).unwrap();
        }
        service
            .save_quest(&QuestRecord::from_quest("u2", &state.quests[0]))
            .unwrap();

        assert_eq!(service.list_quests("u1").unwrap().len(), 3);
        assert_eq!(service.list_quests("u2").unwrap().len(), 1);
        assert_eq!(
            service.list_quests("").unwrap_err().code,
            ApiErrorCode::MissingUserId
        );
    }

    #[test]
    fn colon_in_user_id_cannot_leak_into_other_listings() {
        let (_dir, service) = service();
        let state = initial_state("u1", "Ada");
        let foreign = QuestRecord::from_quest("alice:evil", &state.quests[0]);

        assert_eq!(
            service.save_quest(&foreign).unwrap_err().code,
            ApiErrorCode::InvalidValue
        );
        assert!(service.list_quests("alice").unwrap().is_empty());
        assert_eq!(
            service.list_quests("alice:evil").unwrap_err().code,
            ApiErrorCode::InvalidValue
        );
    }

    #[test]
    fn user_ids_are_case_sensitive() {
        let (_dir, service) = service();
        let state = initial_state("u1", "Ada");
        service
            .save_quest(&QuestRecord::from_quest("Bob", &state.quests[0]))
            .unwrap();
        service
            .save_quest(&QuestRecord::from_quest("bob", &state.quests[1]))
            .unwrap();

        let upper = service.list_quests("Bob").unwrap();
        let lower = service.list_quests("bob").unwrap();
        assert_eq!(upper.len(), 1);
        assert_eq!(lower.len(), 1);
        assert_eq!(upper[0].id, state.quests[0].id);
        assert_eq!(lower[0].id, state.quests[1].id);

        service.delete_quest("bob", &state.quests[1].id).unwrap();
        assert_eq!(service.list_quests("Bob").unwrap().len(), 1);
    }

    #[test]
    fn invalid_records_are_not_written() {
        let (_dir, service) = service();
        let state = initial_state("u1", "Ada");
        let mut record = QuestRecord::from_quest("u1", &state.quests[0]);
        record.quest_type = "yearly".to_string();

        assert_eq!(service.save_quest(&record).unwrap_err().code, ApiErrorCode::InvalidType);
        assert!(service.list_quests("u1").unwrap().is_empty());
    }

    #[test]
    fn profile_get_and_delete_missing() {
        let (_dir, service) = service();
        let state = initial_state("u1", "Ada");
        assert_eq!(service.get_profile("u1").unwrap_err().code, ApiErrorCode::NotFound);
        service.save_profile(&ProfileRecord::from_user(&state.user)).unwrap();
        assert_eq!(service.get_profile("u1").unwrap().level, 1);
        assert_eq!(
            service.delete_quest("u1", "nope").unwrap_err().code,
            ApiErrorCode::NotFound
        );
    }
}
