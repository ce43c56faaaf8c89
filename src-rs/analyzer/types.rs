use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisItem {
    pub component: String,
    pub status: String,
    pub details: String,
    pub recommendation: String,
}

/// Structured outcome of one analysis. Opaque to the task store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: String,
    pub analysis: Vec<AnalysisItem>,
    pub potential_causes: Vec<String>,
    pub suggested_solutions: Vec<String>,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    /// Display stub for a failed task. Never looks like a successful report:
    /// zero confidence and `error` always set.
    pub fn failure(message: &str, generated_at: DateTime<Utc>) -> Self {
        Self {
            summary: "AI processing error".to_string(),
            analysis: vec![AnalysisItem {
                component: "AI Processing".to_string(),
                status: "Failed".to_string(),
                details: message.to_string(),
                recommendation: "Please retry or contact support.".to_string(),
            }],
            potential_causes: vec!["Internal error".to_string()],
            suggested_solutions: vec!["Contact technical support.".to_string()],
            confidence_score: 0.0,
            generated_at,
            error: Some("Error during AI processing.".to_string()),
        }
    }
}

#[derive(Clone, Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    Backend(String),

    #[error("invalid analyzer response: {0}")]
    InvalidResponse(String),

    #[error("analysis timed out after {}s", .0.as_secs_f64())]
    TimedOut(Duration),
}

/// Maps a problem description plus raw collector output to a report.
/// May be slow, may fail; callers never retry.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, raw_system_info: &str, problem_text: &str) -> Result<Report, AnalysisError>;
}
