pub mod config;
pub mod error;
pub mod helpers;

#[path = "analyzer/lib.rs"]
pub mod analyzer;
#[path = "llm/lib.rs"]
pub mod llm;
#[path = "task/lib.rs"]
pub mod task;
#[path = "api/lib.rs"]
pub mod api;

pub use analyzer::{Analyzer, Report};
pub use config::ServiceConfig;
pub use error::DiagnosticError;
pub use task::{TaskManager, TaskStatus, TaskStore, TaskView};
