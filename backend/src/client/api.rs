//! Reqwest-backed client for the `/api/v1` routes.
//!
//! The client owns transport details only: bearer headers, envelope
//! decoding and error mapping. A `401` from any route clears the stored
//! session so the front end falls back to its sign-in screen.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::session::{ClientSession, SessionHandle};
use crate::domain::{
    DashboardPeriod, DashboardSummary, Department, Error, Notification, NotificationId,
    NotificationView, Task, TaskId, User, UserId,
};
use crate::inbound::http::envelope::{
    CountBody, DashboardBody, Envelope, MessageBody, NotificationBody, NotificationsBody,
    ReadBody, SessionBody, TaskBody, TasksBody, UserBody, UsersBody,
};
use crate::inbound::http::notifications::CreateNotificationRequest;
use crate::inbound::http::tasks::{CommentRequest, CreateTaskRequest, TaskListParams};
use crate::inbound::http::users::{LoginRequest, RegisterRequest, UpdateUserRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const API_PREFIX: &str = "api/v1/";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("no signed-in session")]
    NotSignedIn,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {status}: {}", error.message())]
    Api { status: StatusCode, error: Error },
    #[error("could not decode {status} response: {message}")]
    Decode { status: StatusCode, message: String },
}

impl ClientError {
    /// HTTP status of a server-side refusal, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Anonymous,
    Bearer,
}

/// Typed API client. Clones share the connection pool and the session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    api_root: Url,
    session: SessionHandle,
}

impl ApiClient {
    /// Build a client for the server at `base` (for example
    /// `http://localhost:5000/`), optionally resuming a stored session.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, session: Option<ClientSession>) -> Result<Self, ClientError> {
        Self::with_timeout(base, session, DEFAULT_TIMEOUT)
    }

    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_timeout(
        mut base: Url,
        session: Option<ClientSession>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_root: base.join(API_PREFIX)?,
            session: SessionHandle::new(session),
        })
    }

    /// Current session, if signed in.
    pub fn session(&self) -> Option<ClientSession> {
        self.session.get()
    }

    /// Forget the session locally. The server keeps no session state.
    pub fn logout(&self) {
        if self.session.clear() {
            info!("signed out");
        }
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<ClientSession, ClientError> {
        let body: SessionBody = self
            .send(Method::POST, "auth/register", Auth::Anonymous, Some(request))
            .await?;
        Ok(self.store(body))
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<ClientSession, ClientError> {
        let request = LoginRequest {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let body: SessionBody = self
            .send(Method::POST, "auth/login", Auth::Anonymous, Some(&request))
            .await?;
        Ok(self.store(body))
    }

    /// Create or promote the bootstrap administrator and sign in as it.
    pub async fn bootstrap_admin(&self) -> Result<ClientSession, ClientError> {
        let body: SessionBody = self
            .send(Method::POST, "auth/create-admin", Auth::Anonymous, None::<&()>)
            .await?;
        Ok(self.store(body))
    }

    pub async fn current_user(&self) -> Result<User, ClientError> {
        let body: UserBody = self.get("auth/me").await?;
        Ok(body.user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ClientError> {
        let body: UsersBody = self.get("auth/users").await?;
        Ok(body.users)
    }

    pub async fn update_user(
        &self,
        id: &UserId,
        request: &UpdateUserRequest,
    ) -> Result<User, ClientError> {
        let body: UserBody = self
            .send(Method::PUT, &format!("auth/users/{id}"), Auth::Bearer, Some(request))
            .await?;
        Ok(body.user)
    }

    pub async fn delete_user(&self, id: &UserId) -> Result<String, ClientError> {
        self.delete(&format!("auth/users/{id}")).await
    }

    pub async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, ClientError> {
        let body: TaskBody = self
            .send(Method::POST, "tasks", Auth::Bearer, Some(request))
            .await?;
        Ok(body.task)
    }

    pub async fn list_tasks(&self, params: &TaskListParams) -> Result<Vec<Task>, ClientError> {
        let url = self.api_root.join("tasks")?;
        let request = self.authorise(self.http.get(url).query(params))?;
        let body: TasksBody = self.execute(request).await?;
        Ok(body.tasks)
    }

    pub async fn get_task(&self, id: &TaskId) -> Result<Task, ClientError> {
        let body: TaskBody = self.get(&format!("tasks/{id}")).await?;
        Ok(body.task)
    }

    /// Send a partial update; the server decides which keys the caller may
    /// change.
    pub async fn update_task(
        &self,
        id: &TaskId,
        changes: &Map<String, Value>,
    ) -> Result<Task, ClientError> {
        let body: TaskBody = self
            .send(Method::PUT, &format!("tasks/{id}"), Auth::Bearer, Some(changes))
            .await?;
        Ok(body.task)
    }

    pub async fn delete_task(&self, id: &TaskId) -> Result<String, ClientError> {
        self.delete(&format!("tasks/{id}")).await
    }

    pub async fn add_comment(&self, id: &TaskId, text: &str) -> Result<Task, ClientError> {
        let request = CommentRequest {
            text: text.to_owned(),
        };
        let body: TaskBody = self
            .send(
                Method::POST,
                &format!("tasks/{id}/comment"),
                Auth::Bearer,
                Some(&request),
            )
            .await?;
        Ok(body.task)
    }

    pub async fn create_notification(
        &self,
        request: &CreateNotificationRequest,
    ) -> Result<Notification, ClientError> {
        let body: NotificationBody = self
            .send(Method::POST, "notifications", Auth::Bearer, Some(request))
            .await?;
        Ok(body.notification)
    }

    pub async fn list_notifications(&self) -> Result<Vec<NotificationView>, ClientError> {
        let body: NotificationsBody = self.get("notifications").await?;
        Ok(body.notifications)
    }

    pub async fn unread_count(&self) -> Result<u64, ClientError> {
        let body: CountBody = self.get("notifications/unread-count").await?;
        Ok(body.count)
    }

    /// Mark a notification read and return the stored receipt time.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<DateTime<Utc>, ClientError> {
        let body: ReadBody = self
            .send(
                Method::PUT,
                &format!("notifications/{id}/read"),
                Auth::Bearer,
                None::<&()>,
            )
            .await?;
        Ok(body.read_at)
    }

    pub async fn delete_notification(&self, id: &NotificationId) -> Result<String, ClientError> {
        self.delete(&format!("notifications/{id}")).await
    }

    pub async fn dashboard(
        &self,
        period: DashboardPeriod,
        department: Option<Department>,
    ) -> Result<DashboardSummary, ClientError> {
        let period = match period {
            DashboardPeriod::Week => "week",
            DashboardPeriod::Month => "month",
            DashboardPeriod::Year => "year",
        };
        let mut query = vec![("period", period)];
        if let Some(department) = department {
            query.push(("department", department.label()));
        }
        let url = self.api_root.join("dashboard")?;
        let request = self.authorise(self.http.get(url).query(&query))?;
        let body: DashboardBody = self.execute(request).await?;
        Ok(body.data)
    }

    fn store(&self, body: SessionBody) -> ClientSession {
        let session = ClientSession::from(body);
        self.session.replace(session.clone());
        info!(user_id = %session.user.id(), "signed in");
        session
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(Method::GET, path, Auth::Bearer, None::<&()>).await
    }

    async fn delete(&self, path: &str) -> Result<String, ClientError> {
        let body: MessageBody = self
            .send(Method::DELETE, path, Auth::Bearer, None::<&()>)
            .await?;
        Ok(body.message)
    }

    async fn send<T, B>(
        &self,
        method: Method,
        path: &str,
        auth: Auth,
        body: Option<&B>,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.api_root.join(path)?;
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        if auth == Auth::Bearer {
            request = self.authorise(request)?;
        }
        self.execute(request).await
    }

    fn authorise(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let session = self.session.get().ok_or(ClientError::NotSignedIn)?;
        Ok(request.header(reqwest::header::AUTHORIZATION, session.bearer()))
    }

    async fn execute<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status == StatusCode::UNAUTHORIZED && self.session.clear() {
            debug!("session cleared after 401");
        }
        if !status.is_success() {
            let error = serde_json::from_slice::<Error>(&bytes).map_err(|err| {
                ClientError::Decode {
                    status,
                    message: err.to_string(),
                }
            })?;
            return Err(ClientError::Api { status, error });
        }
        serde_json::from_slice::<Envelope<T>>(&bytes)
            .map(|envelope| envelope.body)
            .map_err(|err| ClientError::Decode {
                status,
                message: err.to_string(),
            })
    }
}
