use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use chrono::{Duration, Utc};

use super::types::{Task, TaskStatus};
use crate::error::DiagnosticError;

static COUNTER: AtomicUsize = AtomicUsize::new(1);

/// In-memory task map. Every mutation runs inside a single write-lock
/// section, so readers never observe a half-applied transition.
pub struct TaskStore {
    tasks: RwLock<HashMap<String, Task>>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    pub fn new() -> Self {
        Self {
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, problem_text: &str, raw_system_info: &str) -> Result<Task, DiagnosticError> {
        let id = next_id();
        let task = Task {
            id: id.clone(),
            status: TaskStatus::Pending,
            submitted_at: Utc::now(),
            completed_at: None,
            problem_text: problem_text.to_string(),
            raw_system_info: raw_system_info.to_string(),
            report: None,
            error_message: None,
        };
        let mut map = self.tasks.write().map_err(|err| poisoned(&id, err))?;
        map.insert(id, task.clone());
        Ok(task)
    }

    pub fn get(&self, id: &str) -> Result<Option<Task>, DiagnosticError> {
        let map = self.tasks.read().map_err(|err| poisoned(id, err))?;
        Ok(map.get(id).cloned())
    }

    /// Replaces the stored value. The caller is responsible for the
    /// legality of the status change; use [`TaskStore::transition`] for a
    /// checked step.
    pub fn update(&self, task: Task) -> Result<(), DiagnosticError> {
        let mut map = self.tasks.write().map_err(|err| poisoned(&task.id, err))?;
        match map.get_mut(&task.id) {
            Some(slot) => {
                *slot = task;
                Ok(())
            }
            None => Err(DiagnosticError::consistency(&task.id, "task vanished from store")),
        }
    }

    /// Compare-and-set step of the state machine: applies `apply` only if the
    /// task is currently in `expected` and the resulting status is a legal
    /// successor of it.
    pub fn transition<F>(&self, id: &str, expected: TaskStatus, apply: F) -> Result<Task, DiagnosticError>
    where
        F: FnOnce(&mut Task),
    {
        let mut map = self.tasks.write().map_err(|err| poisoned(id, err))?;
        let slot = map
            .get_mut(id)
            .ok_or_else(|| DiagnosticError::consistency(id, "task vanished from store"))?;
        let mut next = slot.clone();
        apply(&mut next);
        if slot.status != expected || !expected.can_transition_to(next.status) {
            return Err(DiagnosticError::InvalidTransition {
                task_id: id.to_string(),
                from: slot.status,
                to: next.status,
            });
        }
        *slot = next.clone();
        Ok(next)
    }

    /// Most recently submitted first.
    pub fn list(&self, limit: usize) -> Result<Vec<Task>, DiagnosticError> {
        let map = self.tasks.read().map_err(|err| poisoned("*", err))?;
        let mut items: Vec<Task> = map.values().cloned().collect();
        items.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| id_sequence(&b.id).cmp(&id_sequence(&a.id)))
        });
        items.truncate(limit);
        Ok(items)
    }

    /// Entry count. A poisoned lock still yields the real count since every
    /// write is a single insert, replace or retain.
    pub fn len(&self) -> usize {
        self.tasks.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops terminal tasks completed more than `max_age` ago. Returns the
    /// number removed.
    pub fn prune_finished(&self, max_age: Duration) -> usize {
        let cutoff = Utc::now() - max_age;
        let mut map = match self.tasks.write() {
            Ok(lock) => lock,
            Err(_) => return 0,
        };
        let before = map.len();
        map.retain(|_, task| match task.completed_at {
            Some(done) if task.status.is_terminal() => done > cutoff,
            _ => true,
        });
        before - map.len()
    }
}

fn next_id() -> String {
    let count = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("task_{}_{}", Utc::now().timestamp_millis(), count)
}

// ids created in the same millisecond are ordered by their counter suffix
fn id_sequence(id: &str) -> usize {
    id.rsplit('_').next().and_then(|n| n.parse().ok()).unwrap_or(0)
}

fn poisoned<T>(id: &str, _: PoisonError<T>) -> DiagnosticError {
    DiagnosticError::consistency(id, "task store lock poisoned")
}
