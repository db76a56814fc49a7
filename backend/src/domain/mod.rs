//! Domain primitives, rules and services.
//!
//! Purpose: strongly typed users, tasks and notifications; the visibility
//! and authorization rules over them; dashboard aggregation; and the
//! services implementing the driving ports in [`ports`]. Nothing here
//! performs I/O except through port traits.
//!
//! Public surface:
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failure payload.
//! - [`User`], [`Task`], [`Notification`]: the three stored aggregates.
//! - [`access`]: who may see or change what.
//! - [`dashboard`]: aggregation over visible tasks.

pub mod access;
pub mod auth;
pub mod dashboard;
pub mod error;
pub mod notification;
pub mod ports;
pub mod task;
pub mod task_listing;
pub mod trace_id;
pub mod user;

mod account_service;
mod notification_service;
mod task_service;

pub use self::access::{
    AccessDenied, NotificationVisibility, Requester, TaskVisibility, authorize_task_patch,
    ensure_admin, ensure_admin_remains, ensure_can_read_notification, ensure_can_read_task,
};
pub use self::account_service::{AccountService, BOOTSTRAP_ADMIN_NAME, BootstrapAdmin};
pub use self::auth::{
    AuthSession, AuthToken, CredentialsValidationError, LoginCredentials, PASSWORD_MIN_LEN,
    Password, PasswordHash, Registration, RegistrationParts,
};
pub use self::dashboard::{
    DashboardPeriod, DashboardSummary, EmployeePerformance, PriorityBucket, StatusCounts,
    TrendPoint, UnknownPeriod,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::notification::{
    Notification, NotificationDraft, NotificationDraftParts, NotificationId, NotificationKind,
    NotificationScope, NotificationValidationError, NotificationView, ReadReceipt,
};
pub use self::notification_service::NotificationService;
pub use self::task::{
    Assignment, CommentInput, EMPLOYEE_EDITABLE_FIELDS, Progress, Task, TaskComment, TaskDraft,
    TaskDraftParts, TaskId, TaskPatch, TaskPriority, TaskStatus, TaskTitle, TaskValidationError,
    parse_due_date,
};
pub use self::task_listing::{
    DueWindow, SortOrder, TaskFilter, TaskQuery, TaskQueryParts, TaskSortKey,
};
pub use self::task_service::TaskService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Department, Email, Role, User, UserAccount, UserChanges, UserId, UserName,
    UserValidationError,
};

/// Convenient result alias for fallible domain operations.
///
/// # Examples
/// ```
/// use taskboard::domain::{DomainResult, Error};
///
/// fn refuse() -> DomainResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(refuse().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
