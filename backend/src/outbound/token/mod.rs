//! Signed bearer credentials.
//!
//! [`JwtCredentialIssuer`] implements the [`CredentialIssuer`] port with
//! HS256 JSON Web Tokens whose subject is the user id. Expiry is checked
//! against the instant supplied by the caller so the service clock stays
//! authoritative.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CredentialError, CredentialIssuer};
use crate::domain::{AuthToken, UserId};

/// Default credential lifetime.
pub const DEFAULT_TOKEN_LIFETIME: TimeDelta = TimeDelta::days(30);

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: i64,
    exp: i64,
}

pub struct JwtCredentialIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: TimeDelta,
}

impl std::fmt::Debug for JwtCredentialIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCredentialIssuer")
            .field("lifetime", &self.lifetime)
            .finish_non_exhaustive()
    }
}

impl JwtCredentialIssuer {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            lifetime: DEFAULT_TOKEN_LIFETIME,
        }
    }

    #[must_use]
    pub fn with_lifetime(mut self, lifetime: TimeDelta) -> Self {
        self.lifetime = lifetime;
        self
    }
}

impl CredentialIssuer for JwtCredentialIssuer {
    fn issue(&self, user: &UserId, issued_at: DateTime<Utc>) -> Result<AuthToken, CredentialError> {
        let claims = Claims {
            sub: user.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map(AuthToken::new)
            .map_err(|err| CredentialError::issue(err.to_string()))
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<UserId, CredentialError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => CredentialError::expired(),
                _ => CredentialError::invalid(err.to_string()),
            })?;
        if now.timestamp() >= data.claims.exp {
            return Err(CredentialError::expired());
        }
        UserId::new(&data.claims.sub).map_err(|err| CredentialError::invalid(err.to_string()))
    }
}
