//! Builders for HTTP state over Diesel or in-memory repositories.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::info;

use taskboard::domain::ports::{NotificationRepository, TaskRepository, UserRepository};
use taskboard::domain::{AccountService, NotificationService, TaskService};
use taskboard::inbound::http::state::HttpState;
use taskboard::outbound::memory::{
    MemoryNotificationRepository, MemoryTaskRepository, MemoryUserRepository,
};
use taskboard::outbound::password::Argon2PasswordHasher;
use taskboard::outbound::persistence::{
    DieselNotificationRepository, DieselTaskRepository, DieselUserRepository,
};
use taskboard::outbound::token::JwtCredentialIssuer;

use super::ServerConfig;

/// Wire services over the configured stores: Diesel when a pool is present,
/// otherwise process-local memory.
pub fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL repositories");
            build_with_repositories(
                config,
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselTaskRepository::new(pool.clone())),
                Arc::new(DieselNotificationRepository::new(pool.clone())),
            )
        }
        None => {
            info!("no database configured; using in-memory repositories");
            build_with_repositories(
                config,
                Arc::new(MemoryUserRepository::new()),
                Arc::new(MemoryTaskRepository::new()),
                Arc::new(MemoryNotificationRepository::new()),
            )
        }
    }
}

fn build_with_repositories<U, T, N>(
    config: &ServerConfig,
    users: Arc<U>,
    tasks: Arc<T>,
    notifications: Arc<N>,
) -> HttpState
where
    U: UserRepository + 'static,
    T: TaskRepository + 'static,
    N: NotificationRepository + 'static,
{
    let clock = Arc::new(DefaultClock);
    let issuer = JwtCredentialIssuer::new(&config.jwt_secret).with_lifetime(config.token_lifetime);
    let accounts = AccountService::new(
        users.clone(),
        Arc::new(issuer),
        Arc::new(Argon2PasswordHasher::new()),
        clock.clone(),
        config.bootstrap.clone(),
    );
    let tasks = TaskService::new(tasks, users, clock.clone());
    let notifications = NotificationService::new(notifications, clock);
    HttpState::from_services(Arc::new(accounts), Arc::new(tasks), Arc::new(notifications))
}
