use thiserror::Error;

use crate::task::TaskStatus;

/// Errors surfaced by the task lifecycle and its collaborators.
///
/// Only `Validation` and `NotFound` ever reach a client. The consistency
/// variants are produced inside the analysis routine and logged there.
#[derive(Debug, Error)]
pub enum DiagnosticError {
    #[error("{0}")]
    Validation(String),

    #[error("task {0} not found")]
    NotFound(String),

    #[error("task {task_id}: {reason}")]
    InternalConsistency { task_id: String, reason: String },

    #[error("task {task_id}: illegal transition {from:?} -> {to:?}")]
    InvalidTransition {
        task_id: String,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),
}

impl DiagnosticError {
    pub fn consistency(task_id: &str, reason: &str) -> Self {
        Self::InternalConsistency {
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        }
    }
}
