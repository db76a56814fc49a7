//! Driving ports for task use-cases.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::{
    DashboardPeriod, DashboardSummary, Department, Error, Requester, Task, TaskDraft, TaskId,
    TaskQuery,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TasksCommand: Send + Sync {
    async fn create_task(&self, requester: &Requester, draft: TaskDraft) -> Result<Task, Error>;

    /// Apply an update given as the raw request object.
    ///
    /// The key set is authorized as a whole before any value is validated.
    async fn update_task(
        &self,
        requester: &Requester,
        id: &TaskId,
        body: Map<String, Value>,
    ) -> Result<Task, Error>;

    async fn delete_task(&self, requester: &Requester, id: &TaskId) -> Result<(), Error>;

    async fn add_comment(
        &self,
        requester: &Requester,
        id: &TaskId,
        text: String,
    ) -> Result<Task, Error>;
}

/// Parameters for the dashboard summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardRequest {
    pub period: DashboardPeriod,
    pub department: Option<Department>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TasksQuery: Send + Sync {
    async fn list_tasks(&self, requester: &Requester, query: TaskQuery) -> Result<Vec<Task>, Error>;

    async fn get_task(&self, requester: &Requester, id: &TaskId) -> Result<Task, Error>;

    async fn dashboard(
        &self,
        requester: &Requester,
        request: DashboardRequest,
    ) -> Result<DashboardSummary, Error>;
}
