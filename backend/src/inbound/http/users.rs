//! Account and user-management handlers.
//!
//! ```text
//! POST   /api/v1/auth/register      {"name","email","password","department","role"?}
//! POST   /api/v1/auth/login         {"email","password"}
//! POST   /api/v1/auth/create-admin
//! GET    /api/v1/auth/me
//! GET    /api/v1/auth/users
//! PUT    /api/v1/auth/users/{id}    {"name"?,"email"?,"department"?,"role"?}
//! DELETE /api/v1/auth/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ports::BootstrapOutcome;
use crate::domain::{
    Email, Error, LoginCredentials, Registration, RegistrationParts, UserChanges, UserName,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{
    MessageBody, SessionBody, UserBody, UsersBody, created, ok,
};
use crate::inbound::http::schemas::{
    ErrorSchema, SessionResponseSchema, UserResponseSchema, UsersResponseSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{credentials_error, parse_user_id, user_error};

/// Body for `POST /api/v1/auth/register`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Body for `POST /api/v1/auth/login`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for `PUT /api/v1/auth/users/{id}`; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = Error;

    fn try_from(value: UpdateUserRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            name: value.name.map(UserName::new).transpose().map_err(user_error)?,
            email: value.email.map(Email::new).transpose().map_err(user_error)?,
            department: value
                .department
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(user_error)?,
            role: value
                .role
                .as_deref()
                .map(str::parse)
                .transpose()
                .map_err(user_error)?,
        })
    }
}

fn session_body(session: crate::domain::AuthSession) -> SessionBody {
    SessionBody {
        user: session.user,
        token: session.token,
    }
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponseSchema),
        (status = 400, description = "Invalid input or email already registered", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "register",
    security([])
)]
#[post("/auth/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let payload = payload.into_inner();
    let registration = Registration::try_from_parts(RegistrationParts {
        name: &payload.name,
        email: &payload.email,
        password: &payload.password,
        department: &payload.department,
        role: payload.role.as_deref(),
    })
    .map_err(credentials_error)?;
    let session = state.accounts.register(registration).await?;
    Ok(created(session_body(session)))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SessionResponseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "login",
    security([])
)]
#[post("/auth/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(credentials_error)?;
    let session = state.accounts.login(credentials).await?;
    Ok(ok(session_body(session)))
}

/// Ensure an administrator exists.
///
/// Creates one with the configured bootstrap email (201) or promotes the
/// account already holding it (200). Refused once any admin exists.
#[utoipa::path(
    post,
    path = "/api/v1/auth/create-admin",
    responses(
        (status = 201, description = "Administrator created", body = SessionResponseSchema),
        (status = 200, description = "Existing account promoted", body = SessionResponseSchema),
        (status = 400, description = "An administrator already exists", body = ErrorSchema),
        (status = 503, description = "Bootstrap password not configured", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "createAdmin",
    security([])
)]
#[post("/auth/create-admin")]
pub async fn create_admin(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    match state.accounts.bootstrap_admin().await? {
        BootstrapOutcome::Created(session) => {
            info!(user_id = %session.user.id(), "bootstrap administrator created");
            Ok(created(session_body(session)))
        }
        BootstrapOutcome::Promoted(session) => {
            info!(user_id = %session.user.id(), "bootstrap administrator promoted");
            Ok(ok(session_body(session)))
        }
    }
}

/// Current user record.
#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponseSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["auth"],
    operation_id = "currentUser"
)]
#[get("/auth/me")]
pub async fn current_user(user: AuthenticatedUser) -> HttpResponse {
    ok(UserBody {
        user: user.into_user(),
    })
}

/// List every user. Admin only.
#[utoipa::path(
    get,
    path = "/api/v1/auth/users",
    responses(
        (status = 200, description = "Users", body = UsersResponseSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/auth/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<HttpResponse> {
    let users = state.users_query.list_users(&user.requester()).await?;
    Ok(ok(UsersBody { users }))
}

/// Edit a user. Admin only.
#[utoipa::path(
    put,
    path = "/api/v1/auth/users/{id}",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponseSchema),
        (status = 400, description = "Invalid input, email in use or last admin", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/auth/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner())?;
    let changes = UserChanges::try_from(payload.into_inner())?;
    let updated = state
        .users
        .update_user(&user.requester(), &id, changes)
        .await?;
    Ok(ok(UserBody { user: updated }))
}

/// Delete a user. Admin only; the last administrator cannot be removed.
#[utoipa::path(
    delete,
    path = "/api/v1/auth/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted"),
        (status = 400, description = "Last administrator", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/auth/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(&path.into_inner())?;
    state.users.delete_user(&user.requester(), &id).await?;
    Ok(ok(MessageBody::new("تم حذف المستخدم بنجاح")))
}
