use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_system_info: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub task_id: String,
    pub message: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnalysisItem {
    pub component: String,
    pub status: String,
    pub details: String,
    pub recommendation: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub summary: String,
    #[serde(default)]
    pub analysis: Vec<AnalysisItem>,
    #[serde(default)]
    pub potential_causes: Vec<String>,
    #[serde(default)]
    pub suggested_solutions: Vec<String>,
    pub confidence_score: f64,
    pub generated_at: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub task_id: String,
    pub status: String,
    pub submitted_at: String,
    pub completed_at: Option<String>,
    #[serde(default)]
    pub problem_text: String,
    pub message: Option<String>,
    pub report: Option<Report>,
    pub error_message: Option<String>,
}

impl TaskView {
    pub fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "COMPLETED" | "FAILED")
    }
}
