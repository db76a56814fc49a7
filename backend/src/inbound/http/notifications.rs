//! Notification handlers.
//!
//! ```text
//! POST   /api/v1/notifications               {"title","message","type"?,"isGlobal"?,"targetDepartment"?}
//! GET    /api/v1/notifications
//! GET    /api/v1/notifications/unread-count
//! PUT    /api/v1/notifications/{id}/read
//! DELETE /api/v1/notifications/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{NotificationDraft, NotificationDraftParts, ensure_admin};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{
    CountBody, MessageBody, NotificationBody, NotificationsBody, ReadBody, created, ok,
};
use crate::inbound::http::schemas::{
    CountResponseSchema, ErrorSchema, NotificationResponseSchema, NotificationsResponseSchema,
    ReadResponseSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{notification_error, parse_body, parse_notification_id};

/// Body for `POST /api/v1/notifications`.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub title: String,
    pub message: String,
    /// `info` (default), `warning`, `success` or `error`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Defaults to `true`.
    #[serde(default)]
    pub is_global: Option<bool>,
    /// Required when `isGlobal` is `false`.
    #[serde(default)]
    pub target_department: Option<String>,
}

impl From<CreateNotificationRequest> for NotificationDraftParts {
    fn from(value: CreateNotificationRequest) -> Self {
        Self {
            title: value.title,
            message: value.message,
            kind: value.kind,
            is_global: value.is_global,
            target_department: value.target_department,
        }
    }
}

/// Publish a notification. Admin only.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = CreateNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = NotificationResponseSchema),
        (status = 400, description = "Invalid notification", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "createNotification"
)]
#[post("/notifications")]
pub async fn create_notification(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<Value>,
) -> ApiResult<HttpResponse> {
    let requester = user.requester();
    ensure_admin(&requester)?;
    let request: CreateNotificationRequest = parse_body(payload.into_inner())?;
    let draft = NotificationDraft::try_from_parts(request.into()).map_err(notification_error)?;
    let notification = state
        .notifications
        .create_notification(&requester, draft)
        .await?;
    Ok(created(NotificationBody { notification }))
}

/// Notifications visible to the caller, newest first, with read state.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Visible notifications", body = NotificationsResponseSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let notifications = state
        .notifications_query
        .list_notifications(&user.requester())
        .await?;
    Ok(ok(NotificationsBody { notifications }))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread-count",
    responses(
        (status = 200, description = "Unread visible notifications", body = CountResponseSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "unreadCount"
)]
#[get("/notifications/unread-count")]
pub async fn unread_count(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let count = state
        .notifications_query
        .unread_count(&user.requester())
        .await?;
    Ok(ok(CountBody { count }))
}

/// Mark a notification read. Repeating the call keeps the first receipt.
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked read", body = ReadResponseSchema),
        (status = 404, description = "Not found or not visible", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[put("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_notification_id(&path.into_inner())?;
    let receipt = state
        .notifications
        .mark_read(&user.requester(), &id)
        .await?;
    Ok(ok(ReadBody {
        message: "تم تحديث حالة قراءة الإشعار".to_owned(),
        read_at: receipt.read_at,
    }))
}

/// Delete a notification. Admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    params(("id" = String, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "deleteNotification"
)]
#[delete("/notifications/{id}")]
pub async fn delete_notification(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_notification_id(&path.into_inner())?;
    state
        .notifications
        .delete_notification(&user.requester(), &id)
        .await?;
    Ok(ok(MessageBody::new("تم حذف الإشعار بنجاح")))
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
