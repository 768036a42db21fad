//! Configuration management for discuss

use crate::error::{DiscussError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store settings
    pub store: StoreConfig,
    /// Comment settings
    pub comment: CommentConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| e.with_context(format!("Failed to load {}", path.display())))
    }

    /// Parse and validate TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| DiscussError::Toml(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as pretty TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DiscussError::Toml(e.to_string()))
    }

    /// Reject settings the store cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.store.deadline_ms == 0 {
            return Err(DiscussError::Config(
                "store.deadline_ms must be greater than zero".to_string(),
            ));
        }
        if self.store.vote_retries == 0 {
            return Err(DiscussError::Config(
                "store.vote_retries must be greater than zero".to_string(),
            ));
        }
        if self.comment.max_body_length == 0 {
            return Err(DiscussError::Config(
                "comment.max_body_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Store-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Data directory override
    pub data_dir: Option<PathBuf>,
    /// Deadline for every store call, in milliseconds
    pub deadline_ms: u64,
    /// Compare-and-swap attempts per vote before giving up
    pub vote_retries: usize,
}

impl StoreConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            deadline_ms: 2000,
            vote_retries: 16,
        }
    }
}

/// Comment-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentConfig {
    /// Maximum body length in characters
    pub max_body_length: usize,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            max_body_length: crate::comment::validator::MAX_BODY_LENGTH,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when no -v flag is given
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
