//! In-memory task store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ports::{TaskPersistenceError, TaskRepository};
use crate::domain::{Task, TaskFilter, TaskId};

use super::lock;

#[derive(Debug, Default)]
pub struct MemoryTaskRepository {
    tasks: Mutex<HashMap<TaskId, Task>>,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRepository for MemoryTaskRepository {
    async fn insert(&self, task: &Task) -> Result<(), TaskPersistenceError> {
        lock(&self.tasks).insert(task.id, task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskPersistenceError> {
        Ok(lock(&self.tasks).get(id).cloned())
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskPersistenceError> {
        let mut tasks: Vec<Task> = lock(&self.tasks)
            .values()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    async fn update(&self, task: &Task) -> Result<bool, TaskPersistenceError> {
        let mut tasks = lock(&self.tasks);
        match tasks.get_mut(&task.id) {
            Some(stored) => {
                *stored = task.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, TaskPersistenceError> {
        Ok(lock(&self.tasks).remove(id).is_some())
    }
}
