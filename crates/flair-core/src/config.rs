use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::FlairError;

/// Top-level Flair configuration, stored at `~/.flair/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlairConfig {
    /// Database location. Defaults to `~/.flair/flair.db`.
    #[serde(default)]
    pub db_path: Option<PathBuf>,

    /// Upper bound for a single store operation, in milliseconds.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// How long SQLite waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Create the starter collections the first time a profile lists none.
    #[serde(default = "default_seed")]
    pub seed_default_collections: bool,
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_busy_timeout_ms() -> u64 {
    2_000
}

fn default_seed() -> bool {
    true
}

impl Default for FlairConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            store_timeout_ms: default_store_timeout_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
            seed_default_collections: true,
        }
    }
}

impl FlairConfig {
    /// Returns the Flair home directory (`~/.flair/`).
    pub fn home_dir() -> Result<PathBuf, FlairError> {
        let base = dirs::home_dir().ok_or_else(|| FlairError::Config {
            message: "could not determine home directory".into(),
        })?;
        Ok(base.join(".flair"))
    }

    /// Returns the path to the config file.
    pub fn config_path() -> Result<PathBuf, FlairError> {
        Ok(Self::home_dir()?.join("config.toml"))
    }

    /// Returns the configured database path, or the default under the home directory.
    pub fn db_path(&self) -> Result<PathBuf, FlairError> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::home_dir()?.join("flair.db")),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), FlairError> {
        if self.store_timeout_ms == 0 {
            return Err(FlairError::Config {
                message: "store_timeout_ms must be greater than zero".into(),
            });
        }
        Ok(())
    }

    /// Load config from the default location, or return defaults if not found.
    pub fn load() -> Result<Self, FlairError> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, FlairError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| FlairError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<(), FlairError> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), FlairError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| FlairError::Serialization(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Initialize the Flair home directory with default config.
    pub fn init() -> Result<PathBuf, FlairError> {
        let home = Self::home_dir()?;
        std::fs::create_dir_all(&home)?;

        let config_path = Self::config_path()?;
        if !config_path.exists() {
            Self::default().save_to(&config_path)?;
        }

        Ok(home)
    }
}
