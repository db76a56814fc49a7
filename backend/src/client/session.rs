//! Signed-in state held by a front end.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::domain::{AuthSession, AuthToken, User};
use crate::inbound::http::envelope::SessionBody;

/// Token and user record returned by login, registration or bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSession {
    pub user: User,
    pub token: AuthToken,
}

impl ClientSession {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }

    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.token.as_str())
    }
}

impl From<AuthSession> for ClientSession {
    fn from(value: AuthSession) -> Self {
        Self {
            user: value.user,
            token: value.token,
        }
    }
}

impl From<SessionBody> for ClientSession {
    fn from(value: SessionBody) -> Self {
        Self {
            user: value.user,
            token: value.token,
        }
    }
}

/// Session slot shared between clones of one client.
#[derive(Debug, Clone, Default)]
pub(crate) struct SessionHandle(Arc<RwLock<Option<ClientSession>>>);

impl SessionHandle {
    pub(crate) fn new(session: Option<ClientSession>) -> Self {
        Self(Arc::new(RwLock::new(session)))
    }

    pub(crate) fn get(&self) -> Option<ClientSession> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace(&self, session: ClientSession) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(session);
    }

    /// Drop the session, returning whether one was held.
    pub(crate) fn clear(&self) -> bool {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }
}
