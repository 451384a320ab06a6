use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::game::reward::xp_threshold_for_level;

pub const SNAPSHOT_SCHEMA_VERSION: u8 = 1;

/// Happiness and evolution are both bounded to this value.
pub const STAT_CAP: u32 = 100;

// ============================================================================
// User
// ============================================================================

/// Quests completed on a single calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub quests_completed: u32,
}

impl DailyProgress {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            quests_completed: 0,
        }
    }

    /// Count one completion on `today`, starting a fresh counter when the day changed.
    pub fn record(&mut self, today: NaiveDate) {
        if self.date != today {
            self.date = today;
            self.quests_completed = 0;
        }
        self.quests_completed += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub level: u32,
    /// Always strictly below `xp_to_next_level`.
    pub xp: u64,
    pub xp_to_next_level: u64,
    pub coins: u64,
    pub unlocked_worlds: BTreeSet<String>,
    pub active_world: String,
    #[serde(default)]
    pub total_quests_completed: u64,
    pub daily: DailyProgress,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: &str, name: &str, starting_world: &str) -> Self {
        let now = Utc::now();
        let mut unlocked_worlds = BTreeSet::new();
        unlocked_worlds.insert(starting_world.to_string());
        Self {
            id: id.to_string(),
            name: name.to_string(),
            level: 1,
            xp: 0,
            xp_to_next_level: xp_threshold_for_level(1),
            coins: 0,
            unlocked_worlds,
            active_world: starting_world.to_string(),
            total_quests_completed: 0,
            daily: DailyProgress::new(now.date_naive()),
            created_at: now,
        }
    }

    pub fn with_coins(mut self, coins: u64) -> Self {
        self.coins = coins;
        self
    }
}

// ============================================================================
// Quests
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestCategory {
    Daily,
    Weekly,
    Challenge,
}

impl QuestCategory {
    pub const ALL: [QuestCategory; 3] = [Self::Daily, Self::Weekly, Self::Challenge];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestCategory::Daily => "daily",
            QuestCategory::Weekly => "weekly",
            QuestCategory::Challenge => "challenge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Life domain a quest trains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QuestType {
    Habit,
    Study,
    Fitness,
    Finance,
    Social,
    Mental,
}

impl QuestType {
    pub const ALL: [QuestType; 6] = [
        Self::Habit,
        Self::Study,
        Self::Fitness,
        Self::Finance,
        Self::Social,
        Self::Mental,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestType::Habit => "habit",
            QuestType::Study => "study",
            QuestType::Fitness => "fitness",
            QuestType::Finance => "finance",
            QuestType::Social => "social",
            QuestType::Mental => "mental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }

    /// Creature type that reacts to completing a quest of this type.
    /// There is no habit creature; habits feed the mental one.
    pub fn creature_type(&self) -> CreatureType {
        match self {
            QuestType::Habit => CreatureType::Mental,
            QuestType::Study => CreatureType::Study,
            QuestType::Fitness => CreatureType::Fitness,
            QuestType::Finance => CreatureType::Finance,
            QuestType::Social => CreatureType::Social,
            QuestType::Mental => CreatureType::Mental,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: QuestCategory,
    #[serde(rename = "type")]
    pub quest_type: QuestType,
    pub xp_reward: u64,
    pub coin_reward: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub streak: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_progress: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Quest {
    pub fn new(id: &str, title: &str, category: QuestCategory, quest_type: QuestType) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: String::new(),
            category,
            quest_type,
            xp_reward: 0,
            coin_reward: 0,
            completed: false,
            streak: 0,
            progress: None,
            max_progress: None,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_rewards(mut self, xp: u64, coins: u64) -> Self {
        self.xp_reward = xp;
        self.coin_reward = coins;
        self
    }

    /// Track incremental progress; the quest completes when `progress` reaches `max`.
    pub fn with_max_progress(mut self, max: u32) -> Self {
        self.progress = Some(0);
        self.max_progress = Some(max);
        self
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

// ============================================================================
// Creatures
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CreatureType {
    Fitness,
    Finance,
    Study,
    Mental,
    Social,
}

impl CreatureType {
    pub const ALL: [CreatureType; 5] = [
        Self::Fitness,
        Self::Finance,
        Self::Study,
        Self::Mental,
        Self::Social,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CreatureType::Fitness => "fitness",
            CreatureType::Finance => "finance",
            CreatureType::Study => "study",
            CreatureType::Mental => "mental",
            CreatureType::Social => "social",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Display stage derived from the evolution value; never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvolutionStage {
    Baby,
    Teen,
    Adult,
}

impl std::fmt::Display for EvolutionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            EvolutionStage::Baby => "Baby",
            EvolutionStage::Teen => "Teen",
            EvolutionStage::Adult => "Adult",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Creature {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub creature_type: CreatureType,
    pub level: u32,
    /// 0-100
    pub happiness: u32,
    /// 0-100, stages at 33 and 66
    pub evolution: u32,
    #[serde(default)]
    pub last_fed: Option<DateTime<Utc>>,
}

impl Creature {
    pub fn new(id: &str, name: &str, creature_type: CreatureType) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            creature_type,
            level: 1,
            happiness: 50,
            evolution: 0,
            last_fed: None,
        }
    }

    pub fn with_stats(mut self, happiness: u32, evolution: u32) -> Self {
        self.happiness = happiness.min(STAT_CAP);
        self.evolution = evolution.min(STAT_CAP);
        self
    }
}

// ============================================================================
// City
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BuildingType {
    Gym,
    Library,
    Bank,
    ZenGarden,
    CommunityHall,
}

impl BuildingType {
    pub const ALL: [BuildingType; 5] = [
        Self::Gym,
        Self::Library,
        Self::Bank,
        Self::ZenGarden,
        Self::CommunityHall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuildingType::Gym => "gym",
            BuildingType::Library => "library",
            BuildingType::Bank => "bank",
            BuildingType::ZenGarden => "zen_garden",
            BuildingType::CommunityHall => "community_hall",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Map coordinates, used by renderers only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Building {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub building_type: BuildingType,
    /// 0 while locked
    pub level: u32,
    pub unlocked: bool,
    pub unlock_cost: u64,
    #[serde(default)]
    pub position: Position,
}

impl Building {
    pub fn locked(id: &str, name: &str, building_type: BuildingType, unlock_cost: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            building_type,
            level: 0,
            unlocked: false,
            unlock_cost,
            position: Position::default(),
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Position { x, y };
        self
    }
}

// ============================================================================
// Finance
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Income,
    Expense,
}

/// Ledger entry. Never modified after it is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expense {
    pub id: String,
    /// Minor units (cents)
    pub amount: i64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub note: String,
    pub timestamp: DateTime<Utc>,
}

impl Expense {
    pub fn new(id: &str, amount: i64, category: &str, kind: EntryKind) -> Self {
        Self {
            id: id.to_string(),
            amount,
            category: category.to_string(),
            kind,
            note: String::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = note.to_string();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsGoal {
    pub id: String,
    pub name: String,
    /// Minor units
    pub target: i64,
    #[serde(default)]
    pub saved: i64,
    #[serde(default)]
    pub completed: bool,
}

impl SavingsGoal {
    pub fn new(id: &str, name: &str, target: i64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            target,
            saved: 0,
            completed: false,
        }
    }

    /// Whole-number percent toward the target, capped at 100.
    pub fn percent(&self) -> u32 {
        if self.target <= 0 {
            return 0;
        }
        let pct = self.saved.max(0).saturating_mul(100) / self.target;
        pct.min(100) as u32
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthLog {
    pub date: NaiveDate,
    /// Glasses of water
    #[serde(default)]
    pub water: u32,
    /// Hours slept
    #[serde(default)]
    pub sleep: f32,
    #[serde(default)]
    pub steps: u32,
    /// 1-5
    #[serde(default)]
    pub mood: Option<u8>,
    /// Minutes of exercise
    #[serde(default)]
    pub exercise: u32,
}

impl HealthLog {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            water: 0,
            sleep: 0.0,
            steps: 0,
            mood: None,
            exercise: 0,
        }
    }
}

/// Partial update for a day's health log; `None` fields are left alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct HealthUpdate {
    pub water: Option<u32>,
    pub sleep: Option<f32>,
    pub steps: Option<u32>,
    pub mood: Option<u8>,
    pub exercise: Option<u32>,
}

// ============================================================================
// Clan
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clan {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub members: Vec<String>,
    pub joined_at: DateTime<Utc>,
}

// ============================================================================
// Full entity set
// ============================================================================

/// Everything the store persists for one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameState {
    pub user: User,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub creatures: Vec<Creature>,
    #[serde(default)]
    pub buildings: Vec<Building>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub health_logs: Vec<HealthLog>,
    #[serde(default)]
    pub clan: Option<Clan>,
    #[serde(default)]
    pub savings_goals: Vec<SavingsGoal>,
}

impl GameState {
    pub fn quest(&self, quest_id: &str) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == quest_id)
    }

    pub fn creature(&self, creature_id: &str) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id == creature_id)
    }

    pub fn building(&self, building_id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == building_id)
    }

    pub fn health_log(&self, date: NaiveDate) -> Option<&HealthLog> {
        self.health_logs.iter().find(|h| h.date == date)
    }
}
