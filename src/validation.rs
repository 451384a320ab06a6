//! Payload validation for the record service.
//!
//! Every record is checked here before it reaches persistence. Failures map
//! to the service's error codes so callers can tell a malformed request
//! (4xx) from a storage failure (5xx).

use crate::api::{
    AchievementRecord, ApiError, ApiErrorCode, BuildingRecord, CreatureRecord, ProfileRecord,
    QuestRecord, SavingsGoalRecord,
};

/// Quest `type` values accepted over the wire (the period a quest repeats on).
pub const QUEST_TYPES: &[&str] = &["daily", "weekly", "challenge"];
/// Quest `category` values (the life domain).
pub const QUEST_CATEGORIES: &[&str] = &["habit", "study", "fitness", "finance", "social", "mental"];
pub const CREATURE_TYPES: &[&str] = &["fitness", "finance", "study", "mental", "social"];
pub const BUILDING_TYPES: &[&str] = &["gym", "library", "bank", "zen_garden", "community_hall"];
pub const ACHIEVEMENT_CATEGORIES: &[&str] = &["quest", "creature", "city", "finance", "health", "study"];

/// Longest id or title the service stores.
pub const MAX_FIELD_LEN: usize = 120;

/// Separates the segments of a record key, so it may not appear in a user id.
pub const KEY_SEPARATOR: char = ':';

/// User ids are compared exactly. `Bob` and `bob` own separate records.
pub(crate) fn require_user_id(user_id: &str) -> Result<(), ApiError> {
    if user_id.trim().is_empty() {
        return Err(ApiError::new(ApiErrorCode::MissingUserId, "userId is required"));
    }
    if user_id.chars().count() > MAX_FIELD_LEN {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            format!("userId exceeds {} characters", MAX_FIELD_LEN),
        ));
    }
    if user_id.chars().any(|c| c.is_control() || c == KEY_SEPARATOR) {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            format!("userId may not contain control characters or '{}'", KEY_SEPARATOR),
        ));
    }
    Ok(())
}

fn require_field(name: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::new(
            ApiErrorCode::MissingField,
            format!("{} is required", name),
        ));
    }
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            format!("{} exceeds {} characters", name, MAX_FIELD_LEN),
        ));
    }
    if value.chars().any(|c| c.is_control()) {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            format!("{} contains control characters", name),
        ));
    }
    Ok(())
}

fn require_one_of(
    code: ApiErrorCode,
    name: &str,
    value: &str,
    allowed: &[&str],
) -> Result<(), ApiError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ApiError::new(
            code,
            format!("{} must be one of {}", name, allowed.join(", ")),
        ))
    }
}

fn require_percent(name: &str, value: u32) -> Result<(), ApiError> {
    if value > 100 {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            format!("{} must be between 0 and 100", name),
        ));
    }
    Ok(())
}

pub fn validate_quest(record: &QuestRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("id", &record.id)?;
    require_field("title", &record.title)?;
    require_one_of(ApiErrorCode::InvalidType, "type", &record.quest_type, QUEST_TYPES)?;
    require_one_of(
        ApiErrorCode::InvalidCategory,
        "category",
        &record.category,
        QUEST_CATEGORIES,
    )?;
    Ok(())
}

pub fn validate_creature(record: &CreatureRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("id", &record.id)?;
    require_field("name", &record.name)?;
    require_one_of(
        ApiErrorCode::InvalidType,
        "type",
        &record.creature_type,
        CREATURE_TYPES,
    )?;
    require_percent("happiness", record.happiness)?;
    require_percent("evolution", record.evolution)?;
    Ok(())
}

pub fn validate_building(record: &BuildingRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("id", &record.id)?;
    require_one_of(
        ApiErrorCode::InvalidType,
        "type",
        &record.building_type,
        BUILDING_TYPES,
    )?;
    if record.unlocked != (record.level > 0) {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            "level must be 0 exactly when the building is locked",
        ));
    }
    Ok(())
}

pub fn validate_profile(record: &ProfileRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("name", &record.name)?;
    if record.level == 0 {
        return Err(ApiError::new(ApiErrorCode::InvalidValue, "level starts at 1"));
    }
    Ok(())
}

pub fn validate_savings_goal(record: &SavingsGoalRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("id", &record.id)?;
    require_field("name", &record.name)?;
    if record.target <= 0 {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            "target must be positive",
        ));
    }
    if record.saved < 0 {
        return Err(ApiError::new(
            ApiErrorCode::InvalidValue,
            "saved cannot be negative",
        ));
    }
    Ok(())
}

pub fn validate_achievement(record: &AchievementRecord) -> Result<(), ApiError> {
    require_user_id(&record.user_id)?;
    require_field("id", &record.id)?;
    require_field("title", &record.title)?;
    require_one_of(
        ApiErrorCode::InvalidCategory,
        "category",
        &record.category,
        ACHIEVEMENT_CATEGORIES,
    )?;
    Ok(())
}
