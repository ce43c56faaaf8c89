use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use super::scheduler::Scheduler;
use super::store::TaskStore;
use super::types::{TaskStatus, TaskView};
use crate::analyzer::{AnalysisError, Analyzer};
use crate::error::DiagnosticError;

/// Drives diagnostic tasks from submission to a terminal state.
///
/// `submit` only creates the task and hands the analysis routine to the
/// scheduler. The routine is the single writer of status transitions and
/// performs exactly two of them: `Pending -> Processing` before the analyzer
/// call and `Processing -> Completed | Failed` after it. No lock is held
/// while the analyzer runs.
pub struct TaskManager {
    store: Arc<TaskStore>,
    analyzer: Arc<dyn Analyzer>,
    scheduler: Arc<dyn Scheduler>,
    analysis_delay: Duration,
    analysis_timeout: Option<Duration>,
}

impl TaskManager {
    pub fn new(store: Arc<TaskStore>, analyzer: Arc<dyn Analyzer>, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            store,
            analyzer,
            scheduler,
            analysis_delay: Duration::ZERO,
            analysis_timeout: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.analysis_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.analysis_timeout = timeout;
        self
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    /// Creates a task and schedules its analysis. Returns the task id before
    /// any analysis work has started.
    pub fn submit(&self, problem_text: Option<&str>, raw_system_info: Option<&str>) -> Result<String, DiagnosticError> {
        let problem_text = problem_text.map(str::trim).unwrap_or_default();
        let raw_system_info = raw_system_info.map(str::trim).unwrap_or_default();
        if problem_text.is_empty() && raw_system_info.is_empty() {
            warn!("rejected submission without problem text or system information");
            return Err(DiagnosticError::Validation(
                "no diagnostic data provided: supply a problem description and/or system information".to_string(),
            ));
        }

        let task = self.store.create(problem_text, raw_system_info)?;
        info!(
            task_id = %task.id,
            problem = %preview(problem_text),
            raw_len = raw_system_info.len(),
            delay_ms = self.analysis_delay.as_millis() as u64,
            "task created, analysis scheduled"
        );

        let job = run_analysis(
            self.store.clone(),
            self.analyzer.clone(),
            self.analysis_timeout,
            task.id.clone(),
        );
        self.scheduler.schedule(self.analysis_delay, Box::pin(job));
        Ok(task.id)
    }

    pub fn status(&self, task_id: &str) -> Result<TaskView, DiagnosticError> {
        self.store
            .get(task_id)?
            .map(|task| TaskView::from(&task))
            .ok_or_else(|| DiagnosticError::NotFound(task_id.to_string()))
    }

    pub fn list(&self, limit: usize) -> Result<Vec<TaskView>, DiagnosticError> {
        Ok(self.store.list(limit)?.iter().map(TaskView::from).collect())
    }
}

async fn run_analysis(
    store: Arc<TaskStore>,
    analyzer: Arc<dyn Analyzer>,
    timeout: Option<Duration>,
    task_id: String,
) {
    let task = match store.transition(&task_id, TaskStatus::Pending, |task| {
        task.status = TaskStatus::Processing;
    }) {
        Ok(task) => task,
        Err(err) => {
            error!(task_id = %task_id, error = %err, "cannot start analysis");
            return;
        }
    };
    info!(task_id = %task_id, "task processing");

    let analysis = analyzer.analyze(&task.raw_system_info, &task.problem_text);
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, analysis).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AnalysisError::TimedOut(limit)),
        },
        None => analysis.await,
    };

    let finished = match outcome {
        Ok(report) => store.transition(&task_id, TaskStatus::Processing, |task| {
            task.report = Some(report);
            task.status = TaskStatus::Completed;
            task.completed_at = Some(Utc::now());
        }),
        Err(err) => {
            warn!(task_id = %task_id, error = %err, "analysis failed");
            store.transition(&task_id, TaskStatus::Processing, |task| {
                task.error_message = Some(err.to_string());
                task.status = TaskStatus::Failed;
                task.completed_at = Some(Utc::now());
            })
        }
    };

    match finished {
        Ok(task) => info!(task_id = %task_id, status = ?task.status, "task finished"),
        Err(err) => error!(task_id = %task_id, error = %err, "cannot record analysis outcome"),
    }
}

fn preview(text: &str) -> String {
    const LIMIT: usize = 100;
    match text.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
