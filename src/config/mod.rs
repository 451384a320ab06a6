//! # Configuration
//!
//! LifeVerse reads a single TOML file. Every section has defaults, so a
//! missing section (or a missing file at `init` time) is never fatal.
//!
//! ```toml
//! [game]
//! user_id = "player"
//! display_name = "Adventurer"
//! data_dir = "data"
//!
//! [arena]
//! tick_interval_ms = 1000
//!
//! [logging]
//! level = "info"
//! file = "lifeverse.log"
//!
//! [assistant]
//! enabled = false
//! api_key = ""
//! model = "gpt-4o-mini"
//! endpoint = "https://api.openai.com/v1/chat/completions"
//! timeout_seconds = 10
//! ```
//!
//! ```rust,no_run
//! use lifeverse::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Playing as {}", config.game.display_name);
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::game::store::{DEFAULT_USER_ID, DEFAULT_USER_NAME};
use crate::validation::KEY_SEPARATOR;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub arena: ArenaConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub user_id: String,
    pub display_name: String,
    /// Root of the sled database holding the snapshot and local records.
    pub data_dir: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            display_name: DEFAULT_USER_NAME.to_string(),
            data_dir: "data".to_string(),
        }
    }
}

impl GameConfig {
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("lifeverse")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Wall-clock length of one battle second. Lower it to fast-forward demos.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl ArenaConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub enabled: bool,
    /// Chat-completion API key. Empty means the offline fallback is used.
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub timeout_seconds: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false, // needs an API key
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl AssistantConfig {
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.api_key.trim().is_empty()
    }
}

const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.game.user_id.trim().is_empty() {
            return Err(anyhow!("game.user_id must not be empty"));
        }
        if self.game.user_id.contains(KEY_SEPARATOR) {
            return Err(anyhow!("game.user_id must not contain '{}'", KEY_SEPARATOR));
        }
        if self.game.display_name.trim().is_empty() {
            return Err(anyhow!("game.display_name must not be empty"));
        }
        if self.game.data_dir.trim().is_empty() {
            return Err(anyhow!("game.data_dir must not be empty"));
        }
        if self.arena.tick_interval_ms == 0 {
            return Err(anyhow!("arena.tick_interval_ms must be at least 1"));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                VALID_LOG_LEVELS.join(", ")
            ));
        }
        if self.assistant.timeout_seconds == 0 {
            return Err(anyhow!("assistant.timeout_seconds must be at least 1"));
        }
        Ok(())
    }
}
