//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod health;
pub mod notifications;
pub mod schemas;
pub mod state;
pub mod tasks;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` route on `cfg`.
///
/// Extractor failures (malformed JSON, query strings or path segments) are
/// rendered through the standard error envelope.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(error::json_config())
        .app_data(error::query_config())
        .app_data(error::path_config())
        .service(users::register)
        .service(users::login)
        .service(users::create_admin)
        .service(users::current_user)
        .service(users::list_users)
        .service(users::update_user)
        .service(users::delete_user)
        .service(tasks::create_task)
        .service(tasks::list_tasks)
        .service(tasks::get_task)
        .service(tasks::update_task)
        .service(tasks::delete_task)
        .service(tasks::add_comment)
        .service(notifications::unread_count)
        .service(notifications::create_notification)
        .service(notifications::list_notifications)
        .service(notifications::mark_read)
        .service(notifications::delete_notification)
        .service(dashboard::dashboard);
}
