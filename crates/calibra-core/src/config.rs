//! Engine configuration.
//!
//! A single explicit configuration object constructed at startup and passed
//! to the services that need it. Values can be overridden from a TOML file.

use crate::error::{CalibraError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Lowest difficulty level the engine supports.
pub const MIN_LEVEL: u8 = 1;
/// Highest difficulty level the engine supports.
pub const MAX_LEVEL: u8 = 5;

/// Parameters for the adaptive leveling algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelingConfig {
    /// Window average at or above this raises the level by one
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: f64,
    /// Window average at or below this lowers the level by one
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: f64,
    /// Number of most recent scores considered
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    #[serde(default = "default_min_level")]
    pub min_level: u8,
    #[serde(default = "default_max_level")]
    pub max_level: u8,
}

fn default_upper_threshold() -> f64 {
    80.0
}
fn default_lower_threshold() -> f64 {
    50.0
}
fn default_window_size() -> usize {
    3
}
fn default_min_level() -> u8 {
    MIN_LEVEL
}
fn default_max_level() -> u8 {
    MAX_LEVEL
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            upper_threshold: default_upper_threshold(),
            lower_threshold: default_lower_threshold(),
            window_size: default_window_size(),
            min_level: default_min_level(),
            max_level: default_max_level(),
        }
    }
}

/// Bounds and defaults applied when validating session settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLimits {
    #[serde(default = "default_min_questions")]
    pub min_questions: u32,
    #[serde(default = "default_max_questions")]
    pub max_questions: u32,
    #[serde(default = "default_soft_pct")]
    pub default_soft_pct: f64,
    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_min_questions() -> u32 {
    1
}
fn default_max_questions() -> u32 {
    50
}
fn default_soft_pct() -> f64 {
    0.3
}
fn default_language() -> String {
    "en".to_string()
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            min_questions: default_min_questions(),
            max_questions: default_max_questions(),
            default_soft_pct: default_soft_pct(),
            default_language: default_language(),
        }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub leveling: LevelingConfig,
    #[serde(default)]
    pub limits: SessionLimits,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub oracle: OracleTimeouts,
}

/// Store maintenance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backups older than this many days are removed by `cleanup_backups`
    #[serde(default = "default_backup_retention_days")]
    pub backup_retention_days: u32,
}

fn default_backup_retention_days() -> u32 {
    7
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backup_retention_days: default_backup_retention_days(),
        }
    }
}

/// Timeout applied to oracle calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OracleTimeouts {
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for OracleTimeouts {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// any field the file does not set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that the leveling algorithm cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.leveling.lower_threshold >= self.leveling.upper_threshold {
            return Err(CalibraError::config(format!(
                "lower_threshold ({}) must be less than upper_threshold ({})",
                self.leveling.lower_threshold, self.leveling.upper_threshold
            )));
        }
        if self.leveling.min_level >= self.leveling.max_level {
            return Err(CalibraError::config("min_level must be less than max_level"));
        }
        if self.leveling.window_size == 0 {
            return Err(CalibraError::config("window_size must be at least 1"));
        }
        if self.limits.min_questions == 0 || self.limits.min_questions > self.limits.max_questions {
            return Err(CalibraError::config("invalid question count bounds"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.leveling.upper_threshold, 80.0);
        assert_eq!(config.leveling.lower_threshold, 50.0);
        assert_eq!(config.leveling.window_size, 3);
        assert_eq!(config.limits.max_questions, 50);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = EngineConfig::default();
        config.leveling.lower_threshold = 90.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[leveling]\nupper_threshold = 85.0\n").unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.leveling.upper_threshold, 85.0);
        // Unset fields fall back to defaults
        assert_eq!(config.leveling.lower_threshold, 50.0);
        assert_eq!(config.storage.backup_retention_days, 7);
    }
}
