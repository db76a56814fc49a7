//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler, the health probes, the
//! schema wrappers from [`crate::inbound::http::schemas`] and the bearer
//! security scheme. Swagger UI serves it in debug builds and the
//! `openapi-dump` binary prints it for external tooling.

use crate::inbound::http::notifications::CreateNotificationRequest;
use crate::inbound::http::schemas::{
    CountResponseSchema, DashboardResponseSchema, ErrorCodeSchema, ErrorSchema,
    NotificationResponseSchema, NotificationSchema, NotificationViewSchema,
    NotificationsResponseSchema, ReadReceiptSchema, ReadResponseSchema, SessionResponseSchema,
    TaskCommentSchema, TaskResponseSchema, TaskSchema, TasksResponseSchema, UserResponseSchema,
    UserSchema, UsersResponseSchema,
};
use crate::inbound::http::tasks::{CommentRequest, CreateTaskRequest};
use crate::inbound::http::users::{LoginRequest, RegisterRequest, UpdateUserRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        let scheme = HttpBuilder::new()
            .scheme(HttpAuthScheme::Bearer)
            .bearer_format("JWT")
            .description(Some(
                "Token returned by /api/v1/auth/login or /api/v1/auth/register.",
            ))
            .build();
        components.add_security_scheme("BearerToken", SecurityScheme::Http(scheme));
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Taskboard API",
        description = "Task assignment, notifications and dashboards with admin and employee roles."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::create_admin,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::tasks::create_task,
        crate::inbound::http::tasks::list_tasks,
        crate::inbound::http::tasks::get_task,
        crate::inbound::http::tasks::update_task,
        crate::inbound::http::tasks::delete_task,
        crate::inbound::http::tasks::add_comment,
        crate::inbound::http::notifications::create_notification,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::unread_count,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::delete_notification,
        crate::inbound::http::dashboard::dashboard,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserSchema,
        TaskSchema,
        TaskCommentSchema,
        NotificationSchema,
        NotificationViewSchema,
        ReadReceiptSchema,
        SessionResponseSchema,
        UserResponseSchema,
        UsersResponseSchema,
        TaskResponseSchema,
        TasksResponseSchema,
        NotificationResponseSchema,
        NotificationsResponseSchema,
        CountResponseSchema,
        ReadResponseSchema,
        DashboardResponseSchema,
        RegisterRequest,
        LoginRequest,
        UpdateUserRequest,
        CreateTaskRequest,
        CommentRequest,
        CreateNotificationRequest,
    )),
    tags(
        (name = "auth", description = "Registration, sign-in and bootstrap"),
        (name = "users", description = "User administration"),
        (name = "tasks", description = "Task assignment and progress"),
        (name = "notifications", description = "Broadcasts and read receipts"),
        (name = "dashboard", description = "Aggregated task statistics"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
