//! Session repository trait.
//!
//! Defines the persistence contract for sessions, decoupling the state
//! machine from the storage mechanism. All operations are total: they
//! return a classified error rather than panicking across the boundary,
//! and they do not retry internally - retry policy belongs to the caller.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sort order for session listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Created,
    Modified,
    Id,
}

/// Options for enumerating stored sessions.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Maximum number of entries to return
    pub limit: Option<usize>,
    pub sort_key: SortKey,
    /// Include shallow summary fields (requires loading each document)
    pub include_summary: bool,
}

/// Shallow per-session fields included on request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDigest {
    pub job_title: String,
    pub num_questions: u32,
    pub questions_answered: u32,
    pub current_level: u8,
    pub is_complete: bool,
}

/// Lightweight metadata about one stored session document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub id: String,
    /// RFC 3339 creation timestamp
    pub created: String,
    /// RFC 3339 last-modified timestamp
    pub modified: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<SessionDigest>,
}

/// Storage usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub session_count: u64,
    pub session_bytes: u64,
    pub backup_count: u64,
    pub backup_bytes: u64,
}

/// An abstract repository for durable session persistence.
///
/// # Implementation notes
///
/// - `save` must be atomic: a reader never observes a partially written
///   document, and a crash mid-write leaves the previously committed
///   version loadable.
/// - Operations on the same session id are serialized; operations on
///   different ids must not block each other.
/// - A document that fails structural validation is reported as absent
///   (with a warning), never silently repaired.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persists the full session document, backing up any prior version.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Loads a session by id. `Ok(None)` when missing or structurally invalid.
    async fn load(&self, session_id: &str) -> Result<Option<Session>>;

    /// Backs up and removes a session. `NotFound` when the target is absent.
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Enumerates stored sessions, excluding backup artifacts.
    async fn list(&self, options: &ListOptions) -> Result<Vec<SessionMetadata>>;

    /// Whether a document exists for the given id.
    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Removes backups older than `max_age_days`; returns the removed count.
    async fn cleanup_backups(&self, max_age_days: u32) -> Result<usize>;

    /// Storage usage statistics.
    async fn stats(&self) -> Result<StoreStats>;
}
