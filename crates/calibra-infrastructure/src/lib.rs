//! Persistence layer: the JSON file session store, its versioned
//! document schema, and platform path resolution.

pub mod dto;
pub mod json_session_store;
pub mod paths;

pub use crate::json_session_store::JsonSessionStore;
pub use crate::paths::CalibraPaths;
