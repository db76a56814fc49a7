//! Server settings loaded via OrthoConfig and the runtime configuration
//! derived from them.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use rand::RngCore;
use serde::Deserialize;
use tracing::warn;
use zeroize::Zeroizing;

use taskboard::domain::{
    BootstrapAdmin, CredentialsValidationError, Email, Password, UserValidationError,
};
use taskboard::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 5000));
const DEFAULT_TOKEN_LIFETIME_DAYS: u32 = 30;
const DEFAULT_BOOTSTRAP_ADMIN_EMAIL: &str = "admin@example.com";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const EPHEMERAL_SECRET_LEN: usize = 64;

/// Build mode for secret validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate a missing JWT secret and warn.
    Debug,
    /// Release builds require every secret to be configured.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Settings read from `TASKBOARD_*` environment variables, CLI flags and
/// configuration files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "TASKBOARD")]
pub struct ServerSettings {
    /// Listen address.
    #[ortho_config(default = DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,
    /// PostgreSQL URL. Without it the server keeps everything in memory.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub database_url: Option<String>,
    /// HS256 signing secret for bearer tokens.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub jwt_secret: Option<String>,
    /// Bearer token lifetime in days.
    #[ortho_config(default = DEFAULT_TOKEN_LIFETIME_DAYS)]
    pub token_lifetime_days: u32,
    /// Email of the account `POST /auth/create-admin` creates or promotes.
    #[ortho_config(default = DEFAULT_BOOTSTRAP_ADMIN_EMAIL.to_owned())]
    #[serde(deserialize_with = "lenient::string")]
    pub bootstrap_admin_email: String,
    /// Password for a newly created bootstrap administrator.
    #[serde(default, deserialize_with = "lenient::optional_string")]
    pub bootstrap_admin_password: Option<String>,
    /// Upper bound on pooled database connections.
    #[ortho_config(default = DEFAULT_DB_MAX_CONNECTIONS)]
    pub db_max_connections: u32,
}

mod lenient {
    //! Text settings whose values the environment layer may have typed as
    //! numbers, booleans or comma-separated lists.

    use std::fmt;

    use serde::de::{self, Deserializer, SeqAccess, Visitor};
    use serde::Deserialize;

    struct LenientString(String);

    impl<'de> Deserialize<'de> for LenientString {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            deserializer.deserialize_any(LenientVisitor).map(Self)
        }
    }

    struct LenientVisitor;

    impl<'de> Visitor<'de> for LenientVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a string, number or boolean")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_owned())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_i128<E: de::Error>(self, value: i128) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u128<E: de::Error>(self, value: u128) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<String, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut parts = Vec::new();
            while let Some(LenientString(part)) = seq.next_element()? {
                parts.push(part);
            }
            Ok(parts.join(","))
        }
    }

    pub(super) fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        LenientString::deserialize(deserializer).map(|LenientString(value)| value)
    }

    pub(super) fn optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<LenientString>::deserialize(deserializer)
            .map(|value| value.map(|LenientString(value)| value))
    }
}

/// Errors raised while turning [`ServerSettings`] into a [`ServerConfig`].
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("TASKBOARD_JWT_SECRET must be set in release builds")]
    MissingJwtSecret,
    #[error("TASKBOARD_JWT_SECRET must not be blank")]
    BlankJwtSecret,
    #[error("invalid bootstrap admin email: {0}")]
    BootstrapEmail(UserValidationError),
    #[error("invalid bootstrap admin password: {0}")]
    BootstrapPassword(CredentialsValidationError),
}

impl ServerSettings {
    pub fn token_lifetime(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.token_lifetime_days))
    }

    /// Resolve the signing secret, generating a throwaway one in debug builds.
    pub fn jwt_secret(&self, mode: BuildMode) -> Result<Zeroizing<Vec<u8>>, SettingsError> {
        match self.jwt_secret.as_deref() {
            Some(secret) if secret.trim().is_empty() => Err(SettingsError::BlankJwtSecret),
            Some(secret) => Ok(Zeroizing::new(secret.as_bytes().to_vec())),
            None if mode == BuildMode::Debug => {
                warn!("TASKBOARD_JWT_SECRET not set; using an ephemeral secret (dev only)");
                let mut bytes = Zeroizing::new(vec![0_u8; EPHEMERAL_SECRET_LEN]);
                rand::thread_rng().fill_bytes(bytes.as_mut_slice());
                Ok(bytes)
            }
            None => Err(SettingsError::MissingJwtSecret),
        }
    }

    pub fn bootstrap_admin(&self) -> Result<BootstrapAdmin, SettingsError> {
        let email = Email::new(&self.bootstrap_admin_email).map_err(SettingsError::BootstrapEmail)?;
        let password = self
            .bootstrap_admin_password
            .as_deref()
            .map(Password::with_policy)
            .transpose()
            .map_err(SettingsError::BootstrapPassword)?;
        if password.is_none() {
            warn!("TASKBOARD_BOOTSTRAP_ADMIN_PASSWORD not set; create-admin can only promote");
        }
        Ok(BootstrapAdmin { email, password })
    }
}

/// Runtime configuration for [`super::create_server`].
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) jwt_secret: Zeroizing<Vec<u8>>,
    pub(crate) token_lifetime: TimeDelta,
    pub(crate) bootstrap: BootstrapAdmin,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Validate settings for the given build mode.
    pub fn from_settings(settings: &ServerSettings, mode: BuildMode) -> Result<Self, SettingsError> {
        Ok(Self {
            bind_addr: settings.bind_addr,
            jwt_secret: settings.jwt_secret(mode)?,
            token_lifetime: settings.token_lifetime(),
            bootstrap: settings.bootstrap_admin()?,
            db_pool: None,
        })
    }

    /// Attach a database connection pool; repositories become Diesel-backed.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
