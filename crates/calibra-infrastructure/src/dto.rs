//! Session document DTO.
//!
//! The on-disk schema carries an explicit version number so structural
//! validation and future migrations are deliberate rather than ad hoc
//! field-existence checks. The DTO mirrors the domain model; conversion
//! in both directions is lossless.

use calibra_core::session::{
    QuestionRecord, Session, SessionSettings, SessionState, Summary,
};
use serde::{Deserialize, Serialize};

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// V1 of the session document schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDocumentV1 {
    /// On-disk schema version; must equal [`SCHEMA_VERSION`]
    pub schema_version: u32,
    /// Unique session identifier
    pub id: String,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// RFC 3339 last-update timestamp
    pub updated_at: String,
    pub settings: SessionSettings,
    pub state: SessionState,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl SessionDocumentV1 {
    /// Structural validity check applied on load.
    ///
    /// Returns the first problem found. A failing document is treated as
    /// absent by the store, never silently repaired.
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            ));
        }
        if self.id.trim().is_empty() {
            return Err("empty session id".to_string());
        }
        if self.settings.keywords.is_empty() {
            return Err("settings.keywords is empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.settings.soft_pct) {
            return Err(format!("settings.soft_pct {} out of range", self.settings.soft_pct));
        }
        if self.state.asked_count as usize != self.questions.len() {
            return Err(format!(
                "asked_count {} does not match question count {}",
                self.state.asked_count,
                self.questions.len()
            ));
        }
        // Only the last question may lack an answer or evaluation
        for (index, question) in self.questions.iter().enumerate() {
            let is_last = index + 1 == self.questions.len();
            if !is_last && (question.candidate_answer.is_none() || question.evaluation.is_none()) {
                return Err(format!("question {} is open but not last", question.seq));
            }
            if question.seq as usize != index + 1 {
                return Err(format!(
                    "question sequence {} at position {}",
                    question.seq,
                    index + 1
                ));
            }
            if question.evaluation.is_some() && question.candidate_answer.is_none() {
                return Err(format!("question {} evaluated without an answer", question.seq));
            }
        }
        Ok(())
    }

    /// Converts the document into the domain model.
    pub fn into_domain(self) -> Session {
        Session {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            settings: self.settings,
            state: self.state,
            questions: self.questions,
            summary: self.summary,
        }
    }
}

impl From<&Session> for SessionDocumentV1 {
    fn from(session: &Session) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            id: session.id.clone(),
            created_at: session.created_at.clone(),
            updated_at: session.updated_at.clone(),
            settings: session.settings.clone(),
            state: session.state.clone(),
            questions: session.questions.clone(),
            summary: session.summary.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calibra_core::session::SessionSettings;

    fn sample_session() -> Session {
        Session::new(SessionSettings {
            job_title: "Data Scientist".to_string(),
            num_questions: 4,
            soft_pct: 0.25,
            initial_level: 2,
            keywords: vec!["statistics".to_string()],
            language: "en".to_string(),
            profile_brief: None,
        })
    }

    #[test]
    fn test_round_trip_preserves_session() {
        let session = sample_session();
        let document = SessionDocumentV1::from(&session);
        assert_eq!(document.schema_version, SCHEMA_VERSION);
        assert!(document.validate().is_ok());
        assert_eq!(document.into_domain(), session);
    }

    #[test]
    fn test_wrong_version_rejected() {
        let session = sample_session();
        let mut document = SessionDocumentV1::from(&session);
        document.schema_version = 99;
        assert!(document.validate().is_err());
    }

    #[test]
    fn test_asked_count_mismatch_rejected() {
        let session = sample_session();
        let mut document = SessionDocumentV1::from(&session);
        document.state.asked_count = 2;
        let err = document.validate().unwrap_err();
        assert!(err.contains("asked_count"));
    }
}
