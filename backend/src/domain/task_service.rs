//! Task services.
//!
//! [`TaskService`] implements [`TasksCommand`] and [`TasksQuery`]. Every
//! operation resolves the requester's visibility before touching the task
//! store; the dashboard reuses the same path and then aggregates.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value, json};
use tracing::{debug, info};

use crate::domain::dashboard::summarise;
use crate::domain::ports::{
    DashboardRequest, TaskPersistenceError, TaskRepository, TasksCommand, TasksQuery,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    DashboardSummary, Department, Error, Requester, Task, TaskComment, TaskDraft, TaskId,
    TaskPatch, TaskQuery, TaskValidationError, TaskVisibility, UserId,
    authorize_task_patch, ensure_admin, ensure_can_read_task,
};

#[derive(Clone)]
pub struct TaskService<T, U> {
    tasks: Arc<T>,
    users: Arc<U>,
    clock: Arc<dyn Clock>,
}

impl<T, U> TaskService<T, U> {
    pub fn new(tasks: Arc<T>, users: Arc<U>, clock: Arc<dyn Clock>) -> Self {
        Self {
            tasks,
            users,
            clock,
        }
    }
}

fn invalid(error: TaskValidationError) -> Error {
    let details = match &error {
        TaskValidationError::InvalidField { field } => Some(json!({ "field": field })),
        _ => None,
    };
    let err = Error::invalid_request(error.to_string());
    match details {
        Some(details) => err.with_details(details),
        None => err,
    }
}

/// Every user id named by an individual assignment, without repeats.
fn assignee_ids(tasks: &[Task]) -> Vec<UserId> {
    tasks
        .iter()
        .flat_map(|task| task.assignment.assignees().iter().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

impl<T, U> TaskService<T, U>
where
    T: TaskRepository,
    U: UserRepository,
{
    fn map_task_error(error: TaskPersistenceError) -> Error {
        match error {
            TaskPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("task repository unavailable: {message}"))
            }
            TaskPersistenceError::Query { message } => {
                Error::internal(format!("task repository error: {message}"))
            }
        }
    }

    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            other => Error::internal(format!("user repository error: {other}")),
        }
    }

    async fn load(&self, id: &TaskId) -> Result<Task, Error> {
        self.tasks
            .find_by_id(id)
            .await
            .map_err(Self::map_task_error)?
            .ok_or_else(|| Error::not_found("task not found"))
    }

    async fn store(&self, task: &Task) -> Result<(), Error> {
        if self.tasks.update(task).await.map_err(Self::map_task_error)? {
            Ok(())
        } else {
            Err(Error::not_found("task not found"))
        }
    }

    async fn assignee_departments(
        &self,
        tasks: &[Task],
    ) -> Result<HashMap<UserId, Department>, Error> {
        let ids = assignee_ids(tasks);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self
            .users
            .find_many(&ids)
            .await
            .map_err(Self::map_user_error)?;
        Ok(users
            .into_iter()
            .map(|user| (*user.id(), user.department()))
            .collect())
    }

    async fn assignee_names(&self, tasks: &[Task]) -> Result<HashMap<UserId, String>, Error> {
        let ids = assignee_ids(tasks);
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self
            .users
            .find_many(&ids)
            .await
            .map_err(Self::map_user_error)?;
        Ok(users
            .into_iter()
            .map(|user| (*user.id(), user.name().as_ref().to_owned()))
            .collect())
    }

    /// Visible tasks passing `query`, in the order it asks for.
    async fn query_visible(
        &self,
        requester: &Requester,
        query: &TaskQuery,
    ) -> Result<Vec<Task>, Error> {
        let filter = query.store_filter(TaskVisibility::for_requester(requester));
        let tasks = self
            .tasks
            .list(&filter)
            .await
            .map_err(Self::map_task_error)?;
        let departments = if query.needs_assignee_departments() {
            self.assignee_departments(&tasks).await?
        } else {
            HashMap::new()
        };
        Ok(query.refine(tasks, &departments))
    }
}

#[async_trait]
impl<T, U> TasksCommand for TaskService<T, U>
where
    T: TaskRepository,
    U: UserRepository,
{
    async fn create_task(&self, requester: &Requester, draft: TaskDraft) -> Result<Task, Error> {
        ensure_admin(requester)?;
        let task = Task::from_draft(TaskId::random(), draft, requester.id, self.clock.utc());
        self.tasks
            .insert(&task)
            .await
            .map_err(Self::map_task_error)?;
        info!(task_id = %task.id, by = %requester.id, "task created");
        Ok(task)
    }

    async fn update_task(
        &self,
        requester: &Requester,
        id: &TaskId,
        body: Map<String, Value>,
    ) -> Result<Task, Error> {
        let mut task = self.load(id).await?;
        let fields: BTreeSet<String> = body.keys().cloned().collect();
        authorize_task_patch(requester, &task, &fields)?;

        let patch = TaskPatch::from_json(&body).map_err(invalid)?;
        let ignored: Vec<&str> = patch.unknown_fields().collect();
        if !ignored.is_empty() {
            debug!(task_id = %id, fields = ?ignored, "ignoring unknown task fields");
        }
        task.apply(patch, requester, self.clock.utc());
        self.store(&task).await?;
        info!(task_id = %id, by = %requester.id, "task updated");
        Ok(task)
    }

    async fn delete_task(&self, requester: &Requester, id: &TaskId) -> Result<(), Error> {
        ensure_admin(requester)?;
        if !self.tasks.delete(id).await.map_err(Self::map_task_error)? {
            return Err(Error::not_found("task not found"));
        }
        info!(task_id = %id, by = %requester.id, "task deleted");
        Ok(())
    }

    async fn add_comment(
        &self,
        requester: &Requester,
        id: &TaskId,
        text: String,
    ) -> Result<Task, Error> {
        let mut task = self.load(id).await?;
        ensure_can_read_task(requester, &task)?;
        let comment = TaskComment::new(&text, requester.id, self.clock.utc()).map_err(invalid)?;
        task.push_comment(comment);
        self.store(&task).await?;
        debug!(task_id = %id, by = %requester.id, "comment added");
        Ok(task)
    }
}

#[async_trait]
impl<T, U> TasksQuery for TaskService<T, U>
where
    T: TaskRepository,
    U: UserRepository,
{
    async fn list_tasks(&self, requester: &Requester, query: TaskQuery) -> Result<Vec<Task>, Error> {
        self.query_visible(requester, &query).await
    }

    async fn get_task(&self, requester: &Requester, id: &TaskId) -> Result<Task, Error> {
        let task = self.load(id).await?;
        ensure_can_read_task(requester, &task)?;
        Ok(task)
    }

    async fn dashboard(
        &self,
        requester: &Requester,
        request: DashboardRequest,
    ) -> Result<DashboardSummary, Error> {
        let query = TaskQuery {
            due: Some(request.period.window(self.clock.utc())),
            department: request.department,
            ..TaskQuery::default()
        };
        let tasks = self.query_visible(requester, &query).await?;
        let names = self.assignee_names(&tasks).await?;
        Ok(summarise(&tasks, &names))
    }
}

#[cfg(test)]
#[path = "task_service_tests.rs"]
mod tests;
