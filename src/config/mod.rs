//! # Configuration
//!
//! TOML configuration for the escape room host. Every section has defaults,
//! so a file only needs the values it changes.
//!
//! ```toml
//! [storage]
//! data_dir = "./data"
//!
//! [logging]
//! level = "info"
//! file = "escaperoom.log"
//!
//! [editor]
//! max_icons = 5
//! max_answers = 2
//! min_words = 1
//! max_words = 500
//! default_author = "author"
//!
//! [registry]
//! editor_code_length = 8
//! play_code_length = 6
//!
//! [gameplay]
//! win_delay_ms = 1500
//! # time_limit_secs = 600
//! enforce_time_limit = false
//! # max_answer_attempts = 3
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::escape::codes::RoomCodeFormat;
use crate::escape::editor::{EditorRules, DEFAULT_MAX_ICONS};
use crate::escape::gameplay::{GameplaySettings, DEFAULT_WIN_DELAY_MS};
use crate::escape::questions::DEFAULT_MAX_ANSWER_SLOTS;
use crate::escape::registry::RoomRegistry;
use crate::escape::storage::SharedStore;
use crate::validation::{WordRule, MAX_WORDS, MIN_WORDS};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub gameplay: GameplayConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the sled database.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default = "default_max_icons")]
    pub max_icons: usize,
    #[serde(default = "default_max_answers")]
    pub max_answers: usize,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    #[serde(default = "default_author")]
    pub default_author: String,
}

fn default_max_icons() -> usize {
    DEFAULT_MAX_ICONS
}

fn default_max_answers() -> usize {
    DEFAULT_MAX_ANSWER_SLOTS
}

fn default_min_words() -> usize {
    MIN_WORDS
}

fn default_max_words() -> usize {
    MAX_WORDS
}

fn default_author() -> String {
    "author".to_string()
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            max_icons: default_max_icons(),
            max_answers: default_max_answers(),
            min_words: default_min_words(),
            max_words: default_max_words(),
            default_author: default_author(),
        }
    }
}

impl EditorConfig {
    pub fn rules(&self) -> EditorRules {
        EditorRules {
            max_icons: self.max_icons,
            max_answers: self.max_answers.max(1),
            words: WordRule::new(self.min_words, self.max_words),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_editor_code_length")]
    pub editor_code_length: usize,
    #[serde(default = "default_play_code_length")]
    pub play_code_length: usize,
}

fn default_editor_code_length() -> usize {
    RoomCodeFormat::Editor.default_length()
}

fn default_play_code_length() -> usize {
    RoomCodeFormat::Play.default_length()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            editor_code_length: default_editor_code_length(),
            play_code_length: default_play_code_length(),
        }
    }
}

impl RegistryConfig {
    pub fn registry(&self, store: SharedStore) -> RoomRegistry {
        RoomRegistry::new(store).with_code_lengths(self.editor_code_length, self.play_code_length)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameplayConfig {
    #[serde(default = "default_win_delay_ms")]
    pub win_delay_ms: u64,
    /// Countdown shown during play; unset means no countdown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_secs: Option<u64>,
    /// When true, an expired countdown blocks answers and lock input.
    #[serde(default)]
    pub enforce_time_limit: bool,
    /// Wrong answers allowed per icon; unset means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_answer_attempts: Option<u32>,
}

fn default_win_delay_ms() -> u64 {
    DEFAULT_WIN_DELAY_MS as u64
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            win_delay_ms: default_win_delay_ms(),
            time_limit_secs: None,
            enforce_time_limit: false,
            max_answer_attempts: None,
        }
    }
}

impl GameplayConfig {
    pub fn settings(&self) -> GameplaySettings {
        GameplaySettings {
            win_delay: chrono::Duration::milliseconds(self.win_delay_ms.min(i64::MAX as u64) as i64),
            enforce_time_limit: self.enforce_time_limit,
            max_answer_attempts: self.max_answer_attempts,
        }
    }
}

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

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::metadata(path).await.is_err() {
            return Ok(Config::default());
        }
        Self::load(path).await
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

    /// Reject settings that would make every room unsaveable.
    pub fn validate(&self) -> Result<()> {
        if self.editor.max_icons == 0 {
            return Err(anyhow!("editor.max_icons must be at least 1"));
        }
        if self.editor.min_words > self.editor.max_words {
            return Err(anyhow!(
                "editor.min_words ({}) exceeds editor.max_words ({})",
                self.editor.min_words,
                self.editor.max_words
            ));
        }
        for (name, len) in [
            ("registry.editor_code_length", self.registry.editor_code_length),
            ("registry.play_code_length", self.registry.play_code_length),
        ] {
            if !(6..=8).contains(&len) {
                return Err(anyhow!("{} must be between 6 and 8 (got {})", name, len));
            }
        }
        Ok(())
    }
}
