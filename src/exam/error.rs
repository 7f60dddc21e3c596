// src/exam/error.rs

use thiserror::Error;

use crate::exam::session::SessionPhase;

/// Errors raised by the exam core.
///
/// None of these is fatal: the HTTP layer maps them to a status code and the
/// session actor keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExamError {
    /// Empty question set, unknown question id or an answer of the wrong shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An action was invoked in a phase that does not allow it.
    #[error("cannot {action} while the session is {phase}")]
    PreconditionViolation {
        action: &'static str,
        phase: SessionPhase,
    },

    /// The storage collaborator rejected the result record.
    #[error("failed to persist exam result: {0}")]
    PersistenceFailure(String),

    /// The session actor has exited (abandoned or retention elapsed).
    #[error("exam session is no longer active")]
    SessionClosed,
}

impl ExamError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ExamError::InvalidInput(msg.into())
    }
}
