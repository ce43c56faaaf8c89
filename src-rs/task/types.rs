use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analyzer::Report;

/// Lifecycle states. The derived ordering follows the only legal direction:
/// `Pending < Processing < {Completed, Failed}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn can_transition_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Pending, TaskStatus::Processing)
                | (TaskStatus::Processing, TaskStatus::Completed)
                | (TaskStatus::Processing, TaskStatus::Failed)
        )
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub problem_text: String,
    pub raw_system_info: String,
    /// Only ever set on `Completed`.
    pub report: Option<Report>,
    /// Only ever set on `Failed`.
    pub error_message: Option<String>,
}

/// Read-only projection served to status queries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub task_id: String,
    pub status: TaskStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub problem_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        let base = TaskView {
            task_id: task.id.clone(),
            status: task.status,
            submitted_at: task.submitted_at,
            completed_at: None,
            problem_text: task.problem_text.clone(),
            message: None,
            report: None,
            error_message: None,
        };
        match task.status {
            TaskStatus::Pending => TaskView {
                message: Some("Diagnostic is waiting to be processed.".to_string()),
                ..base
            },
            TaskStatus::Processing => TaskView {
                message: Some("Diagnostic report is being generated.".to_string()),
                ..base
            },
            TaskStatus::Completed => TaskView {
                completed_at: task.completed_at,
                report: task.report.clone(),
                ..base
            },
            TaskStatus::Failed => {
                let error = task
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "unknown error".to_string());
                let generated_at = task.completed_at.unwrap_or(task.submitted_at);
                TaskView {
                    completed_at: task.completed_at,
                    report: Some(Report::failure(&error, generated_at)),
                    error_message: Some(error),
                    ..base
                }
            }
        }
    }
}
