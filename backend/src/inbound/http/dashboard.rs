//! Dashboard handler.
//!
//! ```text
//! GET /api/v1/dashboard?period=week|month|year&department=
//! ```

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::DashboardRequest;
use crate::domain::{DashboardPeriod, Department, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::envelope::{DashboardBody, ok};
use crate::inbound::http::schemas::{DashboardResponseSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{period_error, user_error};

#[derive(Debug, Default, Deserialize, Serialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DashboardParams {
    /// `week`, `month` (default) or `year`.
    pub period: Option<String>,
    /// Department label; `all` or blank means every department.
    pub department: Option<String>,
}

impl TryFrom<DashboardParams> for DashboardRequest {
    type Error = Error;

    fn try_from(value: DashboardParams) -> Result<Self, Self::Error> {
        let period = match value.period.as_deref().map(str::trim) {
            None | Some("") => DashboardPeriod::default(),
            Some(raw) => raw.parse().map_err(period_error)?,
        };
        let department = match value.department.as_deref().map(str::trim) {
            None | Some("" | "all") => None,
            Some(raw) => Some(raw.parse::<Department>().map_err(user_error)?),
        };
        Ok(Self { period, department })
    }
}

/// Aggregate the caller's visible tasks due within the period.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    params(DashboardParams),
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardResponseSchema),
        (status = 400, description = "Invalid period or department", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["dashboard"],
    operation_id = "dashboard"
)]
#[get("/dashboard")]
pub async fn dashboard(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    params: web::Query<DashboardParams>,
) -> ApiResult<HttpResponse> {
    let request = DashboardRequest::try_from(params.into_inner())?;
    let data = state
        .tasks_query
        .dashboard(&user.requester(), request)
        .await?;
    Ok(ok(DashboardBody { data }))
}
