//! Unified path management for calibra data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.local/share/calibra/      # Data directory (platform equivalent)
//! ├── config.toml              # Engine configuration overrides
//! └── sessions/                # One JSON document per session
//!     └── backups/             # Timestamped prior versions
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for calibra.
pub struct CalibraPaths;

impl CalibraPaths {
    /// Returns the calibra data directory (e.g. `~/.local/share/calibra/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|d| d.join("calibra"))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the sessions directory inside the data directory.
    pub fn sessions_dir() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("sessions"))
    }

    /// Returns the path of the engine configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::data_dir()?.join("config.toml"))
    }
}
