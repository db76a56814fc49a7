//! Success envelopes.
//!
//! Every successful response is a JSON object with `"success": true` next to
//! the payload fields. The payload shapes are shared with the API client.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    AuthToken, DashboardSummary, Notification, NotificationView, Task, User,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

pub(crate) fn respond<T: Serialize>(status: StatusCode, body: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        body,
    })
}

pub(crate) fn ok<T: Serialize>(body: T) -> HttpResponse {
    respond(StatusCode::OK, body)
}

pub(crate) fn created<T: Serialize>(body: T) -> HttpResponse {
    respond(StatusCode::CREATED, body)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBody {
    pub user: User,
    pub token: AuthToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBody {
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsersBody {
    pub users: Vec<User>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskBody {
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksBody {
    pub tasks: Vec<Task>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationBody {
    pub notification: Notification,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsBody {
    pub notifications: Vec<NotificationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBody {
    pub message: String,
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CountBody {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardBody {
    pub data: DashboardSummary,
}
