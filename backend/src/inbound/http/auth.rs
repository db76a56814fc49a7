//! Bearer credential extraction.
//!
//! [`AuthenticatedUser`] resolves the `Authorization: Bearer <token>` header
//! through the [`Authenticator`](crate::domain::ports::Authenticator) port
//! held in [`HttpState`], so handlers receive a fresh user record or the
//! request fails with `401` before the handler runs.

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, Requester, User};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The caller, resolved from its bearer credential.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    pub fn requester(&self) -> Requester {
        Requester::from(&self.0)
    }

    pub fn into_user(self) -> User {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<String, Error> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| Error::unauthorized("no token, authorization denied"))?;
    let value = header
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    value
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| Error::unauthorized("no token, authorization denied"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let token = bearer_token(req);
        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let token = token.inspect_err(|err| debug!(reason = %err, "missing bearer token"))?;
            state
                .authenticator
                .authenticate(&token)
                .await
                .map(AuthenticatedUser)
        })
    }
}
