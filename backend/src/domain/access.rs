//! Visibility and authorization rules.
//!
//! Pure decisions over a [`Requester`] and already loaded records. Services
//! call these before touching a store for writes and after loading for reads;
//! list operations use the visibility predicates as filters.

use std::collections::BTreeSet;
use std::fmt;

use super::notification::Notification;
use super::task::{EMPLOYEE_EDITABLE_FIELDS, Task};
use super::user::{Department, Role, User, UserId};
use super::Error;

/// Identity of the caller resolved from its bearer credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: UserId,
    pub role: Role,
    pub department: Department,
}

impl Requester {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self {
            id: *user.id(),
            role: user.role(),
            department: user.department(),
        }
    }
}

/// Reasons an operation is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    AdminOnly,
    TaskOutOfScope,
    FieldsNotEditable { fields: Vec<String> },
    NotificationOutOfScope,
    LastAdmin,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdminOnly => write!(f, "administrator role required"),
            Self::TaskOutOfScope => write!(f, "not permitted to access this task"),
            Self::FieldsNotEditable { fields } => {
                write!(f, "not permitted to update: {}", fields.join(", "))
            }
            Self::NotificationOutOfScope => write!(f, "notification not found"),
            Self::LastAdmin => write!(f, "at least one administrator must remain"),
        }
    }
}

impl std::error::Error for AccessDenied {}

impl From<AccessDenied> for Error {
    fn from(value: AccessDenied) -> Self {
        let message = value.to_string();
        tracing::debug!(reason = %message, "access denied");
        match value {
            AccessDenied::AdminOnly | AccessDenied::TaskOutOfScope => Error::forbidden(message),
            AccessDenied::FieldsNotEditable { fields } => Error::forbidden(message)
                .with_details(serde_json::json!({ "fields": fields })),
            // Out-of-scope notifications are reported exactly like missing ones.
            AccessDenied::NotificationOutOfScope => Error::not_found(message),
            AccessDenied::LastAdmin => Error::invariant_violation(message),
        }
    }
}

pub fn ensure_admin(requester: &Requester) -> Result<(), AccessDenied> {
    if requester.is_admin() {
        Ok(())
    } else {
        Err(AccessDenied::AdminOnly)
    }
}

/// Which tasks a requester may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskVisibility {
    All,
    /// Tasks assigned to `user` individually or to `department` as a whole.
    Scoped { user: UserId, department: Department },
}

impl TaskVisibility {
    pub fn for_requester(requester: &Requester) -> Self {
        if requester.is_admin() {
            Self::All
        } else {
            Self::Scoped {
                user: requester.id,
                department: requester.department,
            }
        }
    }

    pub fn admits(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Scoped { user, department } => {
                task.assignment.includes_user(user)
                    || task.assignment.department() == Some(*department)
            }
        }
    }
}

pub fn ensure_can_read_task(requester: &Requester, task: &Task) -> Result<(), AccessDenied> {
    if TaskVisibility::for_requester(requester).admits(task) {
        Ok(())
    } else {
        Err(AccessDenied::TaskOutOfScope)
    }
}

/// Decide whether `requester` may apply an update touching `fields`.
///
/// Admins may change anything. Everyone else must be able to see the task
/// and may only send employee-editable keys; a single other key refuses the
/// whole request.
pub fn authorize_task_patch(
    requester: &Requester,
    task: &Task,
    fields: &BTreeSet<String>,
) -> Result<(), AccessDenied> {
    if requester.is_admin() {
        return Ok(());
    }
    ensure_can_read_task(requester, task)?;
    let refused: Vec<String> = fields
        .iter()
        .filter(|field| !EMPLOYEE_EDITABLE_FIELDS.contains(&field.as_str()))
        .cloned()
        .collect();
    if refused.is_empty() {
        Ok(())
    } else {
        Err(AccessDenied::FieldsNotEditable { fields: refused })
    }
}

/// Which notifications a requester may see. Independent of role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationVisibility {
    pub department: Department,
}

impl NotificationVisibility {
    pub fn for_requester(requester: &Requester) -> Self {
        Self {
            department: requester.department,
        }
    }

    pub fn admits(&self, notification: &Notification) -> bool {
        match notification.scope.target_department() {
            None => true,
            Some(target) => target == self.department,
        }
    }
}

pub fn ensure_can_read_notification(
    requester: &Requester,
    notification: &Notification,
) -> Result<(), AccessDenied> {
    if NotificationVisibility::for_requester(requester).admits(notification) {
        Ok(())
    } else {
        Err(AccessDenied::NotificationOutOfScope)
    }
}

/// Refuse removing admin rights from `target` when it holds the only ones.
pub fn ensure_admin_remains(target: &User, admin_count: u64) -> Result<(), AccessDenied> {
    if target.is_admin() && admin_count <= 1 {
        Err(AccessDenied::LastAdmin)
    } else {
        Ok(())
    }
}

#[cfg(test)]
#[path = "access_tests.rs"]
mod tests;
