//! Shared harness for the HTTP integration suites.
//!
//! Every suite runs the full `/api/v1` app over the in-memory repositories,
//! a pinned clock and a plain-text password hasher so scenarios stay fast
//! and deterministic.

#![allow(dead_code, reason = "each suite uses a different subset of helpers")]

use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use taskboard::Trace;
use taskboard::domain::ports::{PasswordHashError, PasswordHasher};
use taskboard::domain::{
    AccountService, BootstrapAdmin, Email, NotificationService, Password, PasswordHash,
    TaskService,
};
use taskboard::inbound::http::configure_api;
use taskboard::inbound::http::state::HttpState;
use taskboard::outbound::memory::{
    MemoryNotificationRepository, MemoryTaskRepository, MemoryUserRepository,
};
use taskboard::outbound::token::JwtCredentialIssuer;
use taskboard::test_support::MutableClock;

pub const SIGNING_SECRET: &[u8] = b"integration-signing-secret-of-sufficient-length";
pub const BOOTSTRAP_EMAIL: &str = "admin@example.com";
pub const BOOTSTRAP_PASSWORD: &str = "bootstrap-secret";
pub const PASSWORD: &str = "secret123";

pub fn start_instant() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2025-01-08T09:00:00Z")
        .expect("fixed instant")
        .with_timezone(&Utc)
}

/// Stores the password verbatim; Argon2 has its own adapter tests.
#[derive(Debug, Default)]
pub struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &Password) -> Result<PasswordHash, PasswordHashError> {
        Ok(PasswordHash::new(format!("plain:{}", password.expose())))
    }

    fn verify(&self, password: &Password, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        Ok(hash.as_str() == format!("plain:{}", password.expose()))
    }
}

/// Services over fresh memory stores, sharing one movable clock.
pub fn memory_state(clock: Arc<MutableClock>) -> HttpState {
    let users = Arc::new(MemoryUserRepository::new());
    let bootstrap = BootstrapAdmin {
        email: Email::new(BOOTSTRAP_EMAIL).expect("bootstrap email"),
        password: Some(Password::with_policy(BOOTSTRAP_PASSWORD).expect("bootstrap password")),
    };
    let accounts = AccountService::new(
        users.clone(),
        Arc::new(JwtCredentialIssuer::new(SIGNING_SECRET)),
        Arc::new(PlainHasher),
        clock.clone(),
        bootstrap,
    );
    let tasks = TaskService::new(Arc::new(MemoryTaskRepository::new()), users, clock.clone());
    let notifications = NotificationService::new(Arc::new(MemoryNotificationRepository::new()), clock);
    HttpState::from_services(Arc::new(accounts), Arc::new(tasks), Arc::new(notifications))
}

pub fn app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .wrap(Trace)
        .service(web::scope("/api/v1").configure(configure_api))
}

/// Issue one request and decode the JSON body.
pub async fn call<S, B>(
    app: &S,
    request: actix_test::TestRequest,
    token: Option<&str>,
) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let request = match token {
        Some(token) => request.insert_header(("Authorization", format!("Bearer {token}"))),
        None => request,
    };
    let response = actix_test::call_service(app, request.to_request()).await;
    let status = response.status();
    let bytes = actix_test::read_body(response).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

/// Signed-in account created through `POST /auth/register`.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: String,
    pub token: String,
    pub department: String,
}

pub async fn register<S, B>(
    app: &S,
    email: &str,
    department: &str,
    role: Option<&str>,
) -> Account
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let mut payload = json!({
        "name": email.split('@').next().unwrap_or(email),
        "email": email,
        "password": PASSWORD,
        "department": department,
    });
    if let Some(role) = role {
        payload["role"] = json!(role);
    }
    let (status, body) = call(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(payload),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register {email}: {body}");
    Account {
        id: body["user"]["id"].as_str().expect("user id").to_owned(),
        token: body["token"].as_str().expect("token").to_owned(),
        department: department.to_owned(),
    }
}

/// Ids of the tasks in a `GET /tasks` response, sorted for comparison.
pub fn task_ids(body: &Value) -> Vec<String> {
    let mut ids: Vec<String> = body["tasks"]
        .as_array()
        .expect("tasks array")
        .iter()
        .map(|task| task["id"].as_str().expect("task id").to_owned())
        .collect();
    ids.sort();
    ids
}
