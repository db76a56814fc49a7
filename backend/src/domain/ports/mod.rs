//! Domain ports for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`CredentialIssuer`], [`PasswordHasher`]) are
//! implemented by outbound adapters. Driving ports (`*Command`, `*Query`,
//! [`Authenticator`]) are implemented by domain services and called by the
//! HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod credential_issuer;
mod notification_repository;
mod notifications_command;
mod password_hasher;
mod task_repository;
mod tasks_command;
mod user_repository;
mod users_command;

#[cfg(test)]
pub use account_command::{MockAccountCommand, MockAuthenticator};
pub use account_command::{AccountCommand, Authenticator, BootstrapOutcome};
#[cfg(test)]
pub use credential_issuer::MockCredentialIssuer;
pub use credential_issuer::{CredentialError, CredentialIssuer};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use notification_repository::{NotificationPersistenceError, NotificationRepository};
#[cfg(test)]
pub use notifications_command::{MockNotificationsCommand, MockNotificationsQuery};
pub use notifications_command::{NotificationsCommand, NotificationsQuery};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use task_repository::MockTaskRepository;
pub use task_repository::{TaskPersistenceError, TaskRepository};
#[cfg(test)]
pub use tasks_command::{MockTasksCommand, MockTasksQuery};
pub use tasks_command::{DashboardRequest, TasksCommand, TasksQuery};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_command::{MockUsersCommand, MockUsersQuery};
pub use users_command::{UsersCommand, UsersQuery};
