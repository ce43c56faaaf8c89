use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;

use crate::api::handlers::{handle_health, handle_status, handle_submit, handle_tasks, AppState};
use crate::config::ServiceConfig;
use crate::error::DiagnosticError;
use crate::helpers::build_analyzer;
use crate::task::{TaskManager, TaskStore, TokioScheduler};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/diagnostics", post(handle_submit))
        .route("/api/diagnostics/:task_id", get(handle_status))
        .route("/api/tasks", get(handle_tasks))
        .with_state(state)
}

pub struct DiagnosticServer {
    pub config: ServiceConfig,
    pub manager: Arc<TaskManager>,
}

impl DiagnosticServer {
    pub fn new(config: ServiceConfig) -> Result<Self, DiagnosticError> {
        let analyzer = build_analyzer(&config)?;
        let manager = TaskManager::new(Arc::new(TaskStore::new()), analyzer, Arc::new(TokioScheduler))
            .with_delay(config.analysis_delay)
            .with_timeout(config.analysis_timeout);
        Ok(Self {
            config,
            manager: Arc::new(manager),
        })
    }

    pub async fn start(&self) -> Result<(), DiagnosticError> {
        if let Some(retention) = self.config.task_retention {
            spawn_retention_sweeper(
                self.manager.store().clone(),
                retention,
                self.config.retention_sweep_interval,
            )?;
        }

        let app = build_router(self.manager.clone());
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        info!(%addr, "diagnostic server listening");
        axum::Server::bind(&addr)
            .serve(app.into_make_service())
            .await
            .map_err(|err| DiagnosticError::Server(err.to_string()))
    }
}

fn spawn_retention_sweeper(
    store: Arc<TaskStore>,
    retention: Duration,
    every: Duration,
) -> Result<(), DiagnosticError> {
    let max_age = chrono::Duration::from_std(retention)
        .map_err(|err| DiagnosticError::Config(format!("invalid retention: {}", err)))?;
    info!(retention_secs = retention.as_secs(), "task retention enabled");
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let removed = store.prune_finished(max_age);
            if removed > 0 {
                info!(removed, remaining = store.len(), "pruned expired tasks");
            }
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::task::TaskStatus;

    #[tokio::test(start_paused = true)]
    async fn sweeper_prunes_expired_tasks() {
        let store = Arc::new(TaskStore::new());
        let task = store.create("old", "").unwrap();
        let mut done = store.get(&task.id).unwrap().unwrap();
        done.status = TaskStatus::Completed;
        done.completed_at = Some(Utc::now() - chrono::Duration::hours(2));
        store.update(done).unwrap();

        spawn_retention_sweeper(store.clone(), Duration::from_secs(3600), Duration::from_secs(60)).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(store.is_empty());
    }
}
