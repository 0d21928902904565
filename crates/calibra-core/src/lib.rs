pub mod config;
pub mod error;
pub mod leveling;
pub mod oracle;
pub mod session;

// Re-export common error type
pub use error::{CalibraError, Result};
