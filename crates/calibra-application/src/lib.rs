//! Application layer: the session use case facade and its read models.
//!
//! # Module Structure
//!
//! - `session_usecase`: the state machine driving create / ask / answer /
//!   summarize
//! - `category`: soft vs technical question balancing
//! - `finalize`: summary construction
//! - `views`: serializable projections returned to callers
//! - `bootstrap`: default wiring of store and oracle

pub mod bootstrap;
pub mod category;
pub mod finalize;
pub mod session_usecase;
pub mod views;

pub use session_usecase::SessionUseCase;
pub use views::{AnswerOutcome, QuestionView, SessionCreated, StatusView};
