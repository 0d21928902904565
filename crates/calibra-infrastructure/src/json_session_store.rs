//! File-backed session store with crash-consistent writes.
//!
//! One JSON document per session under the store's base directory. Writes
//! go to a temporary file in the same directory, are fsynced, and then
//! atomically renamed over the target, so a reader never observes a
//! partially written document and a crash mid-write leaves the previously
//! committed version loadable. Prior versions are copied into a
//! `backups/` subdirectory before every overwrite and before deletion.
//!
//! # Directory structure
//!
//! ```text
//! base_dir/
//! ├── <session-id>.json
//! └── backups/
//!     └── backup_<timestamp>_<session-id>.json
//! ```
//!
//! Operations on the same session id are serialized through a per-id
//! async mutex; operations on different ids proceed concurrently.

use crate::dto::SessionDocumentV1;
use async_trait::async_trait;
use calibra_core::error::{CalibraError, Result};
use calibra_core::session::{
    ListOptions, Session, SessionDigest, SessionMetadata, SessionRepository, SortKey, StoreStats,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

const BACKUP_PREFIX: &str = "backup_";
const TEMP_SUFFIX: &str = ".tmp";

/// JSON-file session store implementing [`SessionRepository`].
pub struct JsonSessionStore {
    base_dir: PathBuf,
    backups_dir: PathBuf,
    /// Per-session-id locks; the outer lock only guards the map itself
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl JsonSessionStore {
    /// Creates a store rooted at `base_dir`, creating the directory
    /// structure if needed.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let backups_dir = base_dir.join("backups");
        fs::create_dir_all(&backups_dir)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to create store directories: {e}")))?;
        Ok(Self {
            base_dir,
            backups_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a store at the default platform location.
    pub async fn default_location() -> Result<Self> {
        let dir = crate::paths::CalibraPaths::sessions_dir()
            .map_err(|e| CalibraError::persistence(e.to_string()))?;
        Self::new(dir).await
    }

    /// Returns the directory session files live in.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[cfg(test)]
    async fn lock_entries(&self) -> usize {
        self.locks.lock().await.len()
    }

    async fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drops the lock entry for `session_id` when no operation holds it,
    /// keeping the lock map from growing with every id ever touched.
    async fn evict_lock(&self, session_id: &str) {
        let mut locks = self.locks.lock().await;
        if locks
            .get(session_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(session_id);
        }
    }

    /// Existence probe that surfaces I/O failures instead of masking
    /// them as absence.
    async fn probe(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to probe document: {e}")))
    }

    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_id(session_id)?;
        Ok(self.base_dir.join(format!("{session_id}.json")))
    }

    /// Writes `bytes` to `path` via temp file + fsync + atomic rename.
    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let file_name = path
            .file_name()
            .ok_or_else(|| CalibraError::persistence("target path has no file name"))?
            .to_string_lossy()
            .to_string();
        let temp_path = self.base_dir.join(format!(".{file_name}{TEMP_SUFFIX}"));

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to create temp file: {e}")))?;
        file.write_all(bytes)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to write temp file: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to sync temp file: {e}")))?;
        drop(file);

        fs::rename(&temp_path, path)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to commit document: {e}")))?;
        Ok(())
    }

    /// Copies the current version of `path` into the backups directory.
    async fn backup(&self, path: &Path, session_id: &str) -> Result<()> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S%.3f");
        let backup_name = format!("{BACKUP_PREFIX}{timestamp}_{session_id}.json");
        fs::copy(path, self.backups_dir.join(backup_name))
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to back up document: {e}")))?;
        Ok(())
    }

    async fn read_document(&self, path: &Path, session_id: &str) -> Result<Option<Session>> {
        let content = match fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CalibraError::persistence(format!("failed to read document: {e}")));
            }
        };

        let document: SessionDocumentV1 = match serde_json::from_slice(&content) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "session document failed to parse, treating as absent");
                return Ok(None);
            }
        };

        if let Err(reason) = document.validate() {
            tracing::warn!(session_id, %reason, "session document failed validation, treating as absent");
            return Ok(None);
        }

        Ok(Some(document.into_domain()))
    }

    fn metadata_for(path: &Path, meta: &std::fs::Metadata) -> SessionMetadata {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let modified = meta
            .modified()
            .map(to_rfc3339)
            .unwrap_or_default();
        let created = meta
            .created()
            .map(to_rfc3339)
            .unwrap_or_else(|_| modified.clone());
        SessionMetadata {
            id,
            created,
            modified,
            size_bytes: meta.len(),
            digest: None,
        }
    }
}

fn to_rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339()
}

/// Session ids become file names; restrict them to a safe alphabet.
fn validate_id(session_id: &str) -> Result<()> {
    if session_id.is_empty()
        || !session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CalibraError::validation(format!(
            "invalid session id: '{session_id}'"
        )));
    }
    Ok(())
}

#[async_trait]
impl SessionRepository for JsonSessionStore {
    async fn save(&self, session: &Session) -> Result<()> {
        let path = self.session_path(&session.id)?;
        let document = SessionDocumentV1::from(session);
        let bytes = serde_json::to_vec_pretty(&document)?;

        let lock = self.lock_for(&session.id).await;
        let _guard = lock.lock().await;

        if self.probe(&path).await? {
            self.backup(&path, &session.id).await?;
        }
        self.write_atomic(&path, &bytes).await?;
        tracing::debug!(session_id = %session.id, "session saved");
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<Session>> {
        let path = self.session_path(session_id)?;
        let lock = self.lock_for(session_id).await;
        let _guard = lock.lock().await;
        self.read_document(&path, session_id).await
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id)?;
        let lock = self.lock_for(session_id).await;
        {
            let _guard = lock.lock().await;

            if !self.probe(&path).await? {
                return Err(CalibraError::not_found(session_id));
            }
            self.backup(&path, session_id).await?;
            fs::remove_file(&path)
                .await
                .map_err(|e| CalibraError::persistence(format!("failed to delete document: {e}")))?;
        }
        drop(lock);
        self.evict_lock(session_id).await;
        tracing::info!(session_id, "session deleted");
        Ok(())
    }

    async fn list(&self, options: &ListOptions) -> Result<Vec<SessionMetadata>> {
        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to read store directory: {e}")))?;

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?
        {
            let path = entry.path();
            let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
                continue;
            };
            // Skip backups, temp artifacts, and anything that is not a document
            if !name.ends_with(".json")
                || name.starts_with(BACKUP_PREFIX)
                || name.starts_with('.')
                || path.is_dir()
            {
                continue;
            }
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let mut metadata = Self::metadata_for(&path, &meta);

            if options.include_summary {
                if let Some(session) = self.read_document(&path, &metadata.id).await? {
                    metadata.digest = Some(SessionDigest {
                        job_title: session.settings.job_title.clone(),
                        num_questions: session.settings.num_questions,
                        questions_answered: session
                            .questions
                            .iter()
                            .filter(|q| q.evaluation.is_some())
                            .count() as u32,
                        current_level: session.state.current_level,
                        is_complete: session.is_complete(),
                    });
                }
            }
            sessions.push(metadata);
        }

        match options.sort_key {
            SortKey::Created => sessions.sort_by(|a, b| b.created.cmp(&a.created)),
            SortKey::Modified => sessions.sort_by(|a, b| b.modified.cmp(&a.modified)),
            SortKey::Id => sessions.sort_by(|a, b| a.id.cmp(&b.id)),
        }
        if let Some(limit) = options.limit {
            sessions.truncate(limit);
        }
        Ok(sessions)
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let path = self.session_path(session_id)?;
        self.probe(&path).await
    }

    async fn cleanup_backups(&self, max_age_days: u32) -> Result<usize> {
        let cutoff = SystemTime::now() - Duration::from_secs(u64::from(max_age_days) * 86_400);
        let mut entries = fs::read_dir(&self.backups_dir)
            .await
            .map_err(|e| CalibraError::persistence(format!("failed to read backups directory: {e}")))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?
        {
            let Ok(meta) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = meta.modified() else {
                continue;
            };
            if modified <= cutoff {
                if fs::remove_file(entry.path()).await.is_ok() {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            tracing::info!(removed, "expired backups removed");
        }
        Ok(removed)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let mut stats = StoreStats::default();

        let mut entries = fs::read_dir(&self.base_dir)
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?
        {
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".json") || name.starts_with('.') {
                continue;
            }
            if let Ok(meta) = entry.metadata().await {
                if meta.is_file() {
                    stats.session_count += 1;
                    stats.session_bytes += meta.len();
                }
            }
        }

        let mut backups = fs::read_dir(&self.backups_dir)
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?;
        while let Some(entry) = backups
            .next_entry()
            .await
            .map_err(|e| CalibraError::persistence(e.to_string()))?
        {
            if let Ok(meta) = entry.metadata().await {
                if meta.is_file() {
                    stats.backup_count += 1;
                    stats.backup_bytes += meta.len();
                }
            }
        }
        Ok(stats)
    }
}
