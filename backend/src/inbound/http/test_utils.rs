//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header::AUTHORIZATION;
use actix_web::{App, test as actix_test, web};
use serde_json::Value;

use crate::domain::ports::{
    MockAccountCommand, MockAuthenticator, MockNotificationsCommand, MockNotificationsQuery,
    MockTasksCommand, MockTasksQuery, MockUsersCommand, MockUsersQuery,
};
use crate::domain::{Department, Email, Requester, Role, User, UserId, UserName};

use super::configure_api;
use super::state::HttpState;

pub const ADMIN_ID: &str = "0a1b2c3d-0000-4000-8000-000000000001";
pub const EMPLOYEE_ID: &str = "0a1b2c3d-0000-4000-8000-000000000002";
pub const BEARER: &str = "Bearer test-token";

fn user(id: &str, name: &str, email: &str, department: Department, role: Role) -> User {
    User::new(
        UserId::new(id).expect("fixture id"),
        UserName::new(name).expect("fixture name"),
        Email::new(email).expect("fixture email"),
        department,
        role,
    )
}

pub fn admin() -> User {
    user(ADMIN_ID, "مدير النظام", "admin@example.com", Department::Administration, Role::Admin)
}

pub fn employee() -> User {
    user(EMPLOYEE_ID, "سارة", "sara@example.com", Department::Marketing, Role::Employee)
}

pub fn requester_of(user: &User) -> Requester {
    Requester::from(user)
}

/// One mock per port; unset mocks panic if called.
#[derive(Default)]
pub struct TestPorts {
    pub accounts: MockAccountCommand,
    pub authenticator: MockAuthenticator,
    pub users: MockUsersCommand,
    pub users_query: MockUsersQuery,
    pub tasks: MockTasksCommand,
    pub tasks_query: MockTasksQuery,
    pub notifications: MockNotificationsCommand,
    pub notifications_query: MockNotificationsQuery,
}

impl TestPorts {
    /// Ports whose authenticator resolves any token to `user`.
    pub fn signed_in_as(user: User) -> Self {
        let mut authenticator = MockAuthenticator::new();
        authenticator
            .expect_authenticate()
            .returning(move |_| Ok(user.clone()));
        Self {
            authenticator,
            ..Self::default()
        }
    }

    pub fn into_state(self) -> HttpState {
        HttpState {
            accounts: Arc::new(self.accounts),
            authenticator: Arc::new(self.authenticator),
            users: Arc::new(self.users),
            users_query: Arc::new(self.users_query),
            tasks: Arc::new(self.tasks),
            tasks_query: Arc::new(self.tasks_query),
            notifications: Arc::new(self.notifications),
            notifications_query: Arc::new(self.notifications_query),
        }
    }
}

/// Initialise the `/api/v1` routes over mocked ports.
pub async fn api_service(
    ports: TestPorts,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(
        App::new()
            .app_data(web::Data::new(ports.into_state()))
            .service(web::scope("/api/v1").configure(configure_api)),
    )
    .await
}

/// Attach the test bearer token.
pub fn authorised(req: actix_test::TestRequest) -> actix_test::TestRequest {
    req.insert_header((AUTHORIZATION, BEARER))
}

/// Send a request and decode the JSON reply.
pub async fn send<S>(service: &S, req: actix_test::TestRequest) -> (actix_web::http::StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let res = actix_test::call_service(service, req.to_request()).await;
    let status = res.status();
    let body = actix_test::read_body(res).await;
    let value = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).expect("JSON response body")
    };
    (status, value)
}
