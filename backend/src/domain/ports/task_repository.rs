//! Port for task persistence.

use async_trait::async_trait;

use crate::domain::{Task, TaskFilter, TaskId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by task repository adapters.
    pub enum TaskPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "task repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "task repository query failed: {message}",
    }
}

/// Task store.
///
/// Tasks are written whole; a single task write is atomic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: &Task) -> Result<(), TaskPersistenceError>;

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskPersistenceError>;

    /// Tasks matching `filter`, newest first.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskPersistenceError>;

    /// Replace a stored task. Returns `false` when it does not exist.
    async fn update(&self, task: &Task) -> Result<bool, TaskPersistenceError>;

    /// Returns `false` when the task does not exist.
    async fn delete(&self, id: &TaskId) -> Result<bool, TaskPersistenceError>;
}
