//! Engine error taxonomy.
//!
//! `MalformedCase` is an authoring-time failure: the case cannot be loaded.
//! Every other variant is attempt-time and recoverable; the attempt is left in
//! the state it had before the rejected call.

use thiserror::Error;

use crate::core::types::AttemptStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("malformed case: {}", .0.join("; "))]
    MalformedCase(Vec<String>),

    #[error("action '{action_id}' is unavailable: {reason}")]
    ActionUnavailable { action_id: String, reason: String },

    #[error("attempt '{attempt_id}' is not active (status={status})")]
    AttemptNotActive {
        attempt_id: String,
        status: AttemptStatus,
    },

    #[error("attempt '{attempt_id}' cannot be submitted before any finding is revealed")]
    PrematureSubmission { attempt_id: String },

    #[error("attempt '{attempt_id}' has not been submitted (status={status})")]
    NotSubmitted {
        attempt_id: String,
        status: AttemptStatus,
    },

    #[error("attempt '{attempt_id}' was started on case {expected} but got {actual}")]
    CaseMismatch {
        attempt_id: String,
        expected: String,
        actual: String,
    },

    #[error("'{subject}' is not allowed to {operation}")]
    Forbidden {
        subject: String,
        operation: &'static str,
    },
}

impl EngineError {
    /// True for errors raised while operating on an attempt (as opposed to
    /// loading a case).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, EngineError::MalformedCase(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_case_lists_every_violation() {
        let err = EngineError::MalformedCase(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "malformed case: a; b");
        assert!(!err.is_rejection());
    }

    #[test]
    fn attempt_errors_render_status_label() {
        let err = EngineError::AttemptNotActive {
            attempt_id: "att-1".to_string(),
            status: AttemptStatus::Scored,
        };
        assert_eq!(err.to_string(), "attempt 'att-1' is not active (status=scored)");
        assert!(err.is_rejection());
    }
}
