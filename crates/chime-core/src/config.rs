//! Chime configuration, loaded from `~/.chime/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ChimeError, Result};

/// Retention window applied when no config overrides it (500 seconds).
pub const DEFAULT_RETENTION_WINDOW_MS: i64 = 500 * 1000;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChimeConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Durable map store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend name: "sqlite" or "memory".
    #[serde(default = "default_backend")]
    pub backend: String,
    /// Database path for the sqlite backend. `~` is expanded.
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_backend() -> String { "sqlite".into() }

fn default_store_path() -> String { "~/.chime/chime.db".into() }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    /// Store path with `~` and environment variables expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::full(&self.path)
            .map(|p| p.into_owned())
            .unwrap_or_else(|_| self.path.clone()))
    }
}

/// Scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// How long past its trigger time an entry survives before it is reclaimed.
    #[serde(default = "default_retention_window_ms")]
    pub retention_window_ms: i64,
}

fn default_retention_window_ms() -> i64 { DEFAULT_RETENTION_WINDOW_MS }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { retention_window_ms: DEFAULT_RETENTION_WINDOW_MS }
    }
}

impl ChimeConfig {
    /// Chime home directory (`~/.chime`).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chime")
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load from the default path, falling back to defaults if the file is absent.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path. A missing file is an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ChimeError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ChimeError::config(format!("Serialize: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.retention_window_ms < 0 {
            return Err(ChimeError::config("scheduler.retention_window_ms must not be negative"));
        }
        Ok(())
    }
}
