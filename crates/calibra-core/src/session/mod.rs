//! Session domain module.
//!
//! # Module Structure
//!
//! - `model`: the `Session` aggregate and its child records
//! - `repository`: persistence trait and listing/metadata types

mod model;
mod repository;

pub use model::{
    Evaluation, LevelDirective, QuestionCategory, QuestionRecord, Session, SessionSettings,
    SessionState, Subscores, Summary,
};
pub use repository::{
    ListOptions, SessionDigest, SessionMetadata, SessionRepository, SortKey, StoreStats,
};
