pub use crate::task::{TaskManager, TaskStatus, TaskStore, TaskView};

pub mod handlers;
pub mod server;
