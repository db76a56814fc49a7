//! In-process repositories.
//!
//! Used when no database URL is configured and by the HTTP integration
//! suites. Each store guards its records with a `std::sync::Mutex`; no lock
//! is held across an `.await`.

use std::sync::{Mutex, MutexGuard};

mod notifications;
mod tasks;
mod users;

pub use notifications::MemoryNotificationRepository;
pub use tasks::MemoryTaskRepository;
pub use users::MemoryUserRepository;

/// Lock a store, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}
