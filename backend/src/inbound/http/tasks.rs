//! Task handlers.
//!
//! ```text
//! POST   /api/v1/tasks                {"title","description","assignedTo"|"assignedDepartment","dueDate",...}
//! GET    /api/v1/tasks?status=&priority=&startDate=&endDate=&department=&search=&sortBy=&sortOrder=
//! GET    /api/v1/tasks/{id}
//! PUT    /api/v1/tasks/{id}           partial task object
//! DELETE /api/v1/tasks/{id}
//! POST   /api/v1/tasks/{id}/comment   {"text"}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{TaskDraft, TaskDraftParts, TaskQuery, TaskQueryParts, ensure_admin};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{MessageBody, TaskBody, TasksBody, created, ok};
use crate::inbound::http::schemas::{ErrorSchema, TaskResponseSchema, TasksResponseSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{parse_body, parse_task_id, task_error};

/// Body for `POST /api/v1/tasks`.
///
/// Exactly one of `assignedTo` (non-empty) and `assignedDepartment` must be
/// given.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub assigned_to: Option<Vec<String>>,
    #[serde(default)]
    pub assigned_department: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    /// RFC 3339 instant or `YYYY-MM-DD`.
    pub due_date: String,
    #[serde(default)]
    pub progress: Option<u8>,
}

impl From<CreateTaskRequest> for TaskDraftParts {
    fn from(value: CreateTaskRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            assigned_to: value.assigned_to,
            assigned_department: value.assigned_department,
            status: value.status,
            priority: value.priority,
            due_date: value.due_date,
            progress: value.progress,
        }
    }
}

/// Query string for `GET /api/v1/tasks`. `all` or blank values are ignored.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TaskListParams {
    pub status: Option<String>,
    pub priority: Option<String>,
    /// Due-date window start; applied only together with `endDate`.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl From<TaskListParams> for TaskQueryParts {
    fn from(value: TaskListParams) -> Self {
        Self {
            status: value.status,
            priority: value.priority,
            start_date: value.start_date,
            end_date: value.end_date,
            department: value.department,
            search: value.search,
            sort_by: value.sort_by,
            sort_order: value.sort_order,
        }
    }
}

/// Body for `POST /api/v1/tasks/{id}/comment`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CommentRequest {
    pub text: String,
}

/// Create a task. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = TaskResponseSchema),
        (status = 400, description = "Invalid task", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "createTask"
)]
#[post("/tasks")]
pub async fn create_task(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let requester = user.requester();
    ensure_admin(&requester)?;
    let request: CreateTaskRequest = parse_body(payload.into_inner())?;
    let draft = TaskDraft::try_from_parts(TaskDraftParts::from(request)).map_err(task_error)?;
    let task = state.tasks.create_task(&requester, draft).await?;
    Ok(created(TaskBody { task }))
}

/// List the tasks visible to the caller.
#[utoipa::path(
    get,
    path = "/api/v1/tasks",
    params(TaskListParams),
    responses(
        (status = 200, description = "Visible tasks", body = TasksResponseSchema),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "listTasks"
)]
#[get("/tasks")]
pub async fn list_tasks(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<TaskListParams>,
) -> ApiResult<HttpResponse> {
    let query = TaskQuery::try_from_parts(&TaskQueryParts::from(params.into_inner()))
        .map_err(task_error)?;
    let tasks = state.tasks_query.list_tasks(&user.requester(), query).await?;
    let count = tasks.len();
    Ok(ok(TasksBody { tasks, count }))
}

#[utoipa::path(
    get,
    path = "/api/v1/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Task", body = TaskResponseSchema),
        (status = 403, description = "Not visible to the caller", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "getTask"
)]
#[get("/tasks/{id}")]
pub async fn get_task(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_task_id(&path.into_inner())?;
    let task = state.tasks_query.get_task(&user.requester(), &id).await?;
    Ok(ok(TaskBody { task }))
}

/// Update a task.
///
/// Employees may send only `status`, `progress` and `comments`; any other key
/// refuses the whole request.
#[utoipa::path(
    put,
    path = "/api/v1/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    request_body(content = Object, description = "Partial task fields"),
    responses(
        (status = 200, description = "Updated task", body = TaskResponseSchema),
        (status = 400, description = "Invalid value", body = ErrorSchema),
        (status = 403, description = "Field or task not editable by the caller", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "updateTask"
)]
#[put("/tasks/{id}")]
pub async fn update_task(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let id = parse_task_id(&path.into_inner())?;
    let task = state
        .tasks
        .update_task(&user.requester(), &id, payload.into_inner())
        .await?;
    Ok(ok(TaskBody { task }))
}

/// Delete a task. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/tasks/{id}",
    params(("id" = String, Path, description = "Task id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "deleteTask"
)]
#[delete("/tasks/{id}")]
pub async fn delete_task(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_task_id(&path.into_inner())?;
    state.tasks.delete_task(&user.requester(), &id).await?;
    Ok(ok(MessageBody::new("تم حذف المهمة بنجاح")))
}

/// Append a comment authored by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/tasks/{id}/comment",
    params(("id" = String, Path, description = "Task id")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Task with the new comment", body = TaskResponseSchema),
        (status = 400, description = "Empty comment", body = ErrorSchema),
        (status = 403, description = "Not visible to the caller", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["tasks"],
    operation_id = "addComment"
)]
#[post("/tasks/{id}/comment")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let id = parse_task_id(&path.into_inner())?;
    let task = state
        .tasks
        .add_comment(&user.requester(), &id, payload.into_inner().text)
        .await?;
    Ok(ok(TaskBody { task }))
}

#[cfg(test)]
#[path = "tasks_tests.rs"]
mod tests;
