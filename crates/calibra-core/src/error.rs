//! Error types for the Calibra engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Calibra engine.
///
/// Variants map onto the engine's error taxonomy so that callers can
/// distinguish "this request is invalid" (validation, conflict) from
/// "try again" (dependency, persistence) without parsing messages.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CalibraError {
    /// Malformed or out-of-bounds input, rejected before any persistence
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown or deleted session id
    #[error("Session not found: '{id}'")]
    NotFound { id: String },

    /// Operation not allowed in the session's current state
    #[error("Conflict: {0}")]
    Conflict(String),

    /// External oracle unreachable or returned an unusable response
    #[error("Dependency error: {0}")]
    Dependency(String),

    /// The session store could not complete the operation
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CalibraError {
    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a NotFound error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a Dependency error
    pub fn dependency(message: impl Into<String>) -> Self {
        Self::Dependency(message.into())
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether the caller may retry the same request unchanged.
    ///
    /// True for dependency and persistence failures; validation and
    /// conflict errors describe a request that will never succeed as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency(_) | Self::Persistence(_) | Self::Io { .. })
    }

    /// A short machine-readable classification string for API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound { .. } => "not_found",
            Self::Conflict(_) => "conflict",
            Self::Dependency(_) => "dependency",
            Self::Persistence(_) => "persistence",
            Self::Serialization { .. } => "serialization",
            Self::Io { .. } => "io",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for CalibraError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CalibraError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CalibraError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CalibraError>`.
pub type Result<T> = std::result::Result<T, CalibraError>;
