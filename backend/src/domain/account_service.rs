//! Account services: registration, sign-in, bootstrap and user management.
//!
//! [`AccountService`] implements [`AccountCommand`], [`Authenticator`],
//! [`UsersCommand`] and [`UsersQuery`] over the identity store, a credential
//! issuer and a password hasher.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    AccountCommand, Authenticator, BootstrapOutcome, CredentialError, CredentialIssuer,
    PasswordHashError, PasswordHasher, UserPersistenceError, UserRepository, UsersCommand,
    UsersQuery,
};
use crate::domain::{
    AuthSession, Department, Email, Error, LoginCredentials, Password, Registration, Requester,
    Role, User, UserAccount, UserChanges, UserId, UserName, ensure_admin, ensure_admin_remains,
};

/// Display name given to the bootstrap administrator.
pub const BOOTSTRAP_ADMIN_NAME: &str = "مدير النظام";

/// Settings for `POST /auth/create-admin`.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: Email,
    /// Password for a newly created administrator. Without it only promotion
    /// of an existing account is possible.
    pub password: Option<Password>,
}

#[derive(Clone)]
pub struct AccountService<U, C, H> {
    users: Arc<U>,
    issuer: Arc<C>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    bootstrap: BootstrapAdmin,
}

impl<U, C, H> AccountService<U, C, H> {
    pub fn new(
        users: Arc<U>,
        issuer: Arc<C>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
        bootstrap: BootstrapAdmin,
    ) -> Self {
        Self {
            users,
            issuer,
            hasher,
            clock,
            bootstrap,
        }
    }
}

const BAD_CREDENTIALS: &str = "invalid email or password";

impl<U, C, H> AccountService<U, C, H>
where
    U: UserRepository,
    C: CredentialIssuer,
    H: PasswordHasher,
{
    fn map_user_error(error: UserPersistenceError) -> Error {
        match error {
            UserPersistenceError::Connection { message } => {
                Error::service_unavailable(format!("user repository unavailable: {message}"))
            }
            UserPersistenceError::Query { message } => {
                Error::internal(format!("user repository error: {message}"))
            }
            UserPersistenceError::DuplicateEmail { .. } => {
                Error::conflict("email is already registered")
            }
        }
    }

    fn map_hash_error(error: PasswordHashError) -> Error {
        Error::internal(error.to_string())
    }

    fn start_session(&self, user: User) -> Result<AuthSession, Error> {
        let token = self
            .issuer
            .issue(user.id(), self.clock.utc())
            .map_err(|err| Error::internal(err.to_string()))?;
        Ok(AuthSession { user, token })
    }

    async fn create_account(
        &self,
        user: User,
        password: &Password,
    ) -> Result<AuthSession, Error> {
        if self
            .users
            .find_account_by_email(user.email())
            .await
            .map_err(Self::map_user_error)?
            .is_some()
        {
            return Err(Error::conflict("email is already registered"));
        }
        let password_hash = self.hasher.hash(password).map_err(Self::map_hash_error)?;
        let account = UserAccount {
            user: user.clone(),
            password_hash,
        };
        self.users
            .insert(&account)
            .await
            .map_err(Self::map_user_error)?;
        info!(user_id = %user.id(), role = %user.role(), "account created");
        self.start_session(user)
    }

    async fn load_user(&self, id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    async fn admin_count(&self) -> Result<u64, Error> {
        self.users
            .count_by_role(Role::Admin)
            .await
            .map_err(Self::map_user_error)
    }

    async fn promote(&self, mut user: User) -> Result<AuthSession, Error> {
        let name = UserName::new(BOOTSTRAP_ADMIN_NAME)
            .map_err(|err| Error::internal(format!("invalid bootstrap name: {err}")))?;
        user.apply(UserChanges {
            name: Some(name),
            email: None,
            department: Some(Department::Administration),
            role: Some(Role::Admin),
        });
        if !self
            .users
            .update(&user)
            .await
            .map_err(Self::map_user_error)?
        {
            return Err(Error::not_found("user not found"));
        }
        info!(user_id = %user.id(), "existing account promoted to administrator");
        self.start_session(user)
    }
}

#[async_trait]
impl<U, C, H> AccountCommand for AccountService<U, C, H>
where
    U: UserRepository,
    C: CredentialIssuer,
    H: PasswordHasher,
{
    async fn register(&self, registration: Registration) -> Result<AuthSession, Error> {
        let Registration {
            name,
            email,
            password,
            department,
            role,
        } = registration;
        if role == Role::Admin {
            warn!(email = %email, "public registration requested the admin role");
        }
        let user = User::new(UserId::random(), name, email, department, role);
        self.create_account(user, &password).await
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let Some(account) = self
            .users
            .find_account_by_email(credentials.email())
            .await
            .map_err(Self::map_user_error)?
        else {
            debug!("login for unknown email");
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        };
        let matches = self
            .hasher
            .verify(credentials.password(), &account.password_hash)
            .map_err(Self::map_hash_error)?;
        if !matches {
            debug!(user_id = %account.user.id(), "login with wrong password");
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }
        self.start_session(account.user)
    }

    async fn bootstrap_admin(&self) -> Result<BootstrapOutcome, Error> {
        if self.admin_count().await? > 0 {
            return Err(Error::conflict("an administrator already exists"));
        }
        if let Some(account) = self
            .users
            .find_account_by_email(&self.bootstrap.email)
            .await
            .map_err(Self::map_user_error)?
        {
            return self.promote(account.user).await.map(BootstrapOutcome::Promoted);
        }
        let password = self.bootstrap.password.as_ref().ok_or_else(|| {
            Error::service_unavailable("bootstrap administrator password is not configured")
        })?;
        let name = UserName::new(BOOTSTRAP_ADMIN_NAME)
            .map_err(|err| Error::internal(format!("invalid bootstrap name: {err}")))?;
        let user = User::new(
            UserId::random(),
            name,
            self.bootstrap.email.clone(),
            Department::Administration,
            Role::Admin,
        );
        self.create_account(user, password)
            .await
            .map(BootstrapOutcome::Created)
    }
}

#[async_trait]
impl<U, C, H> Authenticator for AccountService<U, C, H>
where
    U: UserRepository,
    C: CredentialIssuer,
    H: PasswordHasher,
{
    async fn authenticate(&self, token: &str) -> Result<User, Error> {
        let user_id = self
            .issuer
            .verify(token, self.clock.utc())
            .map_err(|err| match err {
                CredentialError::Expired => Error::unauthorized("token expired"),
                CredentialError::Invalid { message } | CredentialError::Issue { message } => {
                    debug!(reason = %message, "bearer credential rejected");
                    Error::unauthorized("invalid token")
                }
            })?;
        self.users
            .find_by_id(&user_id)
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::unauthorized("user no longer exists"))
    }
}

#[async_trait]
impl<U, C, H> UsersQuery for AccountService<U, C, H>
where
    U: UserRepository,
    C: CredentialIssuer,
    H: PasswordHasher,
{
    async fn list_users(&self, requester: &Requester) -> Result<Vec<User>, Error> {
        ensure_admin(requester)?;
        self.users.list().await.map_err(Self::map_user_error)
    }
}

#[async_trait]
impl<U, C, H> UsersCommand for AccountService<U, C, H>
where
    U: UserRepository,
    C: CredentialIssuer,
    H: PasswordHasher,
{
    async fn update_user(
        &self,
        requester: &Requester,
        id: &UserId,
        changes: UserChanges,
    ) -> Result<User, Error> {
        ensure_admin(requester)?;
        let mut user = self.load_user(id).await?;

        if changes.role == Some(Role::Employee) && user.is_admin() {
            ensure_admin_remains(&user, self.admin_count().await?)?;
        }
        if let Some(email) = changes.email.as_ref().filter(|email| *email != user.email()) {
            let clash = self
                .users
                .find_account_by_email(email)
                .await
                .map_err(Self::map_user_error)?;
            if clash.is_some_and(|account| account.user.id() != user.id()) {
                return Err(Error::conflict("email is already registered"));
            }
        }

        user.apply(changes);
        if !self
            .users
            .update(&user)
            .await
            .map_err(Self::map_user_error)?
        {
            return Err(Error::not_found("user not found"));
        }
        info!(user_id = %user.id(), by = %requester.id, "user updated");
        Ok(user)
    }

    async fn delete_user(&self, requester: &Requester, id: &UserId) -> Result<(), Error> {
        ensure_admin(requester)?;
        let user = self.load_user(id).await?;
        if user.is_admin() {
            ensure_admin_remains(&user, self.admin_count().await?)?;
        }
        if !self.users.delete(id).await.map_err(Self::map_user_error)? {
            return Err(Error::not_found("user not found"));
        }
        info!(user_id = %id, by = %requester.id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
