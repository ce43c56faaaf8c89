pub mod manager;
pub mod scheduler;
pub mod store;
pub mod types;

pub use manager::TaskManager;
pub use scheduler::{Job, QueuedScheduler, Scheduler, TokioScheduler};
pub use store::TaskStore;
pub use types::{Task, TaskStatus, TaskView};
