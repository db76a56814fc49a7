//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. This
//! module provides the schema definitions required for OpenAPI documentation
//! using utoipa's external schema registration.
//!
//! The wrappers mirror the JSON produced by the domain serde representations
//! and the response envelopes in [`super::envelope`].

#![expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request clashes with existing state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The request would leave the system without an administrator.
    #[schema(rename = "invariant_violation")]
    InvariantViolation,
    /// A backing store could not be reached.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    /// Always `false` for errors.
    success: bool,
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "Something went wrong")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(example = "01HZY8B2W6X5Y7Z9ABCD1234")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    #[schema(rename = "error")]
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User)]
pub struct UserSchema {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: String,
    #[schema(example = "سارة")]
    name: String,
    #[schema(example = "sara@example.com")]
    email: String,
    /// Arabic department label.
    #[schema(example = "التسويق")]
    department: String,
    /// `admin` or `employee`.
    #[schema(example = "employee")]
    role: String,
}

/// OpenAPI schema for [`crate::domain::TaskComment`].
#[derive(ToSchema)]
#[schema(as = crate::domain::TaskComment, rename_all = "camelCase")]
pub struct TaskCommentSchema {
    text: String,
    #[schema(value_type = String)]
    author: String,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::Task`].
///
/// Exactly one of `assignedTo` (non-empty) and `assignedDepartment` is set.
#[derive(ToSchema)]
#[schema(as = crate::domain::Task, rename_all = "camelCase")]
pub struct TaskSchema {
    #[schema(value_type = String)]
    id: String,
    title: String,
    description: String,
    assigned_to: Vec<String>,
    assigned_department: Option<String>,
    #[schema(value_type = String)]
    created_by: String,
    /// `pending`, `in-progress`, `completed` or `delayed`.
    #[schema(example = "in-progress")]
    status: String,
    /// `low`, `medium` or `high`.
    #[schema(example = "medium")]
    priority: String,
    #[schema(value_type = String, format = DateTime)]
    due_date: String,
    comments: Vec<TaskCommentSchema>,
    #[schema(minimum = 0, maximum = 100)]
    progress: u8,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::ReadReceipt`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ReadReceipt, rename_all = "camelCase")]
pub struct ReadReceiptSchema {
    #[schema(value_type = String)]
    user: String,
    #[schema(value_type = String, format = DateTime)]
    read_at: String,
}

/// OpenAPI schema for [`crate::domain::Notification`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Notification, rename_all = "camelCase")]
pub struct NotificationSchema {
    #[schema(value_type = String)]
    id: String,
    title: String,
    message: String,
    /// `info`, `warning`, `success` or `error`.
    #[schema(rename = "type", example = "info")]
    kind: String,
    #[schema(value_type = String)]
    created_by: String,
    is_global: bool,
    target_department: Option<String>,
    read_by: Vec<ReadReceiptSchema>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::NotificationView`]: a notification
/// plus the caller's read state.
#[derive(ToSchema)]
#[schema(as = crate::domain::NotificationView, rename_all = "camelCase")]
pub struct NotificationViewSchema {
    #[schema(value_type = String)]
    id: String,
    title: String,
    message: String,
    #[schema(rename = "type", example = "info")]
    kind: String,
    #[schema(value_type = String)]
    created_by: String,
    is_global: bool,
    target_department: Option<String>,
    read_by: Vec<ReadReceiptSchema>,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
    #[schema(value_type = String, format = DateTime)]
    updated_at: String,
    is_read: bool,
    #[schema(value_type = Option<String>, format = DateTime)]
    read_at: Option<String>,
}

#[derive(ToSchema)]
pub struct SessionResponseSchema {
    success: bool,
    user: UserSchema,
    /// Bearer token for the `Authorization` header.
    token: String,
}

#[derive(ToSchema)]
pub struct UserResponseSchema {
    success: bool,
    user: UserSchema,
}

#[derive(ToSchema)]
pub struct UsersResponseSchema {
    success: bool,
    users: Vec<UserSchema>,
}

#[derive(ToSchema)]
pub struct TaskResponseSchema {
    success: bool,
    task: TaskSchema,
}

#[derive(ToSchema)]
pub struct TasksResponseSchema {
    success: bool,
    tasks: Vec<TaskSchema>,
    count: usize,
}

#[derive(ToSchema)]
pub struct NotificationResponseSchema {
    success: bool,
    notification: NotificationSchema,
}

#[derive(ToSchema)]
pub struct NotificationsResponseSchema {
    success: bool,
    notifications: Vec<NotificationViewSchema>,
}

#[derive(ToSchema)]
pub struct CountResponseSchema {
    success: bool,
    count: u64,
}

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ReadResponseSchema {
    success: bool,
    message: String,
    #[schema(value_type = String, format = DateTime)]
    read_at: String,
}

/// `data` holds `stats`, `priorityDistribution`, `employeePerformance` and
/// `trend`.
#[derive(ToSchema)]
pub struct DashboardResponseSchema {
    success: bool,
    #[schema(value_type = Object)]
    data: serde_json::Value,
}
