//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AccountCommand, Authenticator, NotificationsCommand, NotificationsQuery, TasksCommand,
    TasksQuery, UsersCommand, UsersQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountCommand>,
    pub authenticator: Arc<dyn Authenticator>,
    pub users: Arc<dyn UsersCommand>,
    pub users_query: Arc<dyn UsersQuery>,
    pub tasks: Arc<dyn TasksCommand>,
    pub tasks_query: Arc<dyn TasksQuery>,
    pub notifications: Arc<dyn NotificationsCommand>,
    pub notifications_query: Arc<dyn NotificationsQuery>,
}

impl HttpState {
    /// Build state from service objects that each implement a family of
    /// ports.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use taskboard::domain::{
    ///     AccountService, BootstrapAdmin, Email, NotificationService, TaskService,
    /// };
    /// use taskboard::inbound::http::state::HttpState;
    /// use taskboard::outbound::memory::{
    ///     MemoryNotificationRepository, MemoryTaskRepository, MemoryUserRepository,
    /// };
    /// use taskboard::outbound::password::Argon2PasswordHasher;
    /// use taskboard::outbound::token::JwtCredentialIssuer;
    ///
    /// let users = Arc::new(MemoryUserRepository::new());
    /// let accounts = Arc::new(AccountService::new(
    ///     users.clone(),
    ///     Arc::new(JwtCredentialIssuer::new(b"secret")),
    ///     Arc::new(Argon2PasswordHasher::new()),
    ///     Arc::new(DefaultClock),
    ///     BootstrapAdmin { email: Email::new("admin@example.com").unwrap(), password: None },
    /// ));
    /// let tasks = Arc::new(TaskService::new(
    ///     Arc::new(MemoryTaskRepository::new()),
    ///     users,
    ///     Arc::new(DefaultClock),
    /// ));
    /// let notifications = Arc::new(NotificationService::new(
    ///     Arc::new(MemoryNotificationRepository::new()),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let state = HttpState::from_services(accounts, tasks, notifications);
    /// ```
    pub fn from_services<A, T, N>(accounts: Arc<A>, tasks: Arc<T>, notifications: Arc<N>) -> Self
    where
        A: AccountCommand + Authenticator + UsersCommand + UsersQuery + 'static,
        T: TasksCommand + TasksQuery + 'static,
        N: NotificationsCommand + NotificationsQuery + 'static,
    {
        Self {
            accounts: accounts.clone(),
            authenticator: accounts.clone(),
            users: accounts.clone(),
            users_query: accounts,
            tasks: tasks.clone(),
            tasks_query: tasks,
            notifications: notifications.clone(),
            notifications_query: notifications,
        }
    }
}
