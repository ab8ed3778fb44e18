//! # Configuration
//!
//! RedMUD reads a small TOML file with three sections:
//!
//! ```toml
//! [storage]
//! data_dir = "./data/world"
//!
//! [world]
//! empty_area_policy = "purge"   # or "retain"
//!
//! [logging]
//! level = "info"
//! file = "redmud.log"
//! ```
//!
//! Every section has defaults, so a partial file is valid.
//!
//! ```rust,no_run
//! use redmud::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("World data in {}", config.storage.data_dir);
//!     Ok(())
//! }
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::world::EmptyAreaPolicy;

const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Fsync after every write. Turning this off trades durability for speed.
    #[serde(default = "default_flush_writes")]
    pub flush_writes: bool,
}

fn default_flush_writes() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data/world".to_string(),
            flush_writes: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorldConfig {
    /// What happens to an area once its last room is deleted.
    #[serde(default)]
    pub empty_area_policy: EmptyAreaPolicy,
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

impl Config {
    /// Load configuration from a TOML file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields `None` so the caller can
    /// fall back to defaults. A file that exists and fails to read, parse or
    /// validate is still an error.
    pub async fn load_optional(path: &str) -> Result<Option<Self>> {
        match fs::try_exists(path).await {
            Ok(false) => Ok(None),
            _ => Self::load(path).await.map(Some),
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config {
            logging: LoggingConfig {
                file: Some("redmud.log".to_string()),
                ..LoggingConfig::default()
            },
            ..Config::default()
        };
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(anyhow!(
                "logging.level {:?} is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }
        Ok(())
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.logging
            .level
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}
