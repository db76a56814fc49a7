//! Broadcast notifications and per-user read receipts.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::{Department, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationValidationError {
    InvalidId,
    EmptyTitle,
    EmptyMessage,
    UnknownKind,
    MissingTargetDepartment,
    UnknownDepartment,
}

impl fmt::Display for NotificationValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "notification id must be a valid UUID"),
            Self::EmptyTitle => write!(f, "notification title must not be empty"),
            Self::EmptyMessage => write!(f, "notification message must not be empty"),
            Self::UnknownKind => write!(f, "type must be info, warning, success or error"),
            Self::MissingTargetDepartment => {
                write!(f, "targetDepartment is required when isGlobal is false")
            }
            Self::UnknownDepartment => write!(f, "department is not recognised"),
        }
    }
}

impl std::error::Error for NotificationValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, NotificationValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(NotificationValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| NotificationValidationError::InvalidId)
    }

    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Display severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[default]
    Info,
    Warning,
    Success,
    Error,
}

impl NotificationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = NotificationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Self::Info, Self::Warning, Self::Success, Self::Error]
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or(NotificationValidationError::UnknownKind)
    }
}

/// Audience of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationScope {
    Global,
    Department(Department),
}

impl NotificationScope {
    pub fn is_global(self) -> bool {
        matches!(self, Self::Global)
    }

    pub fn target_department(self) -> Option<Department> {
        match self {
            Self::Global => None,
            Self::Department(department) => Some(department),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub user: UserId,
    pub read_at: DateTime<Utc>,
}

/// Stored notification.
///
/// ## Invariants
/// - a user appears at most once in `read_by`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "NotificationDto", into = "NotificationDto")]
pub struct Notification {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_by: UserId,
    pub scope: NotificationScope,
    read_by: Vec<ReadReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_draft(
        id: NotificationId,
        draft: NotificationDraft,
        creator: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: draft.title,
            message: draft.message,
            kind: draft.kind,
            created_by: creator,
            scope: draft.scope,
            read_by: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a notification from storage, keeping the first receipt per user.
    pub fn with_receipts(mut self, receipts: impl IntoIterator<Item = ReadReceipt>) -> Self {
        self.read_by.clear();
        for receipt in receipts {
            if self.receipt_for(&receipt.user).is_none() {
                self.read_by.push(receipt);
            }
        }
        self
    }

    pub fn read_by(&self) -> &[ReadReceipt] {
        &self.read_by
    }

    pub fn receipt_for(&self, user: &UserId) -> Option<&ReadReceipt> {
        self.read_by.iter().find(|receipt| receipt.user == *user)
    }

    /// Record that `user` read the notification at `now`.
    ///
    /// Returns the receipt that now stands for the user and whether it was
    /// newly added; a repeated call leaves the original receipt untouched.
    pub fn mark_read(&mut self, user: UserId, now: DateTime<Utc>) -> (ReadReceipt, bool) {
        if let Some(existing) = self.receipt_for(&user) {
            return (*existing, false);
        }
        let receipt = ReadReceipt { user, read_at: now };
        self.read_by.push(receipt);
        self.updated_at = now;
        (receipt, true)
    }

    /// Project the notification for one reader.
    pub fn view_for(&self, user: &UserId) -> NotificationView {
        let receipt = self.receipt_for(user);
        NotificationView {
            notification: self.clone(),
            is_read: receipt.is_some(),
            read_at: receipt.map(|receipt| receipt.read_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationDto {
    id: NotificationId,
    title: String,
    message: String,
    #[serde(rename = "type", default)]
    kind: NotificationKind,
    created_by: UserId,
    is_global: bool,
    #[serde(default)]
    target_department: Option<Department>,
    #[serde(default)]
    read_by: Vec<ReadReceipt>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(value: Notification) -> Self {
        Self {
            id: value.id,
            title: value.title,
            message: value.message,
            kind: value.kind,
            created_by: value.created_by,
            is_global: value.scope.is_global(),
            target_department: value.scope.target_department(),
            read_by: value.read_by,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<NotificationDto> for Notification {
    fn from(value: NotificationDto) -> Self {
        // A targeted record without a department can only come from a foreign
        // writer; treat it as global rather than hide it from everyone.
        let scope = match (value.is_global, value.target_department) {
            (false, Some(department)) => NotificationScope::Department(department),
            _ => NotificationScope::Global,
        };
        Self {
            id: value.id,
            title: value.title,
            message: value.message,
            kind: value.kind,
            created_by: value.created_by,
            scope,
            read_by: Vec::new(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
        .with_receipts(value.read_by)
    }
}

/// A notification as seen by one reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

/// Validated input for a new notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub scope: NotificationScope,
}

/// Raw creation fields as received from an inbound adapter.
#[derive(Debug, Clone, Default)]
pub struct NotificationDraftParts {
    pub title: String,
    pub message: String,
    pub kind: Option<String>,
    pub is_global: Option<bool>,
    pub target_department: Option<String>,
}

impl NotificationDraft {
    /// Validate raw input. `kind` defaults to info and `is_global` to true.
    pub fn try_from_parts(
        parts: NotificationDraftParts,
    ) -> Result<Self, NotificationValidationError> {
        let title = parts.title.trim();
        if title.is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        let message = parts.message.trim();
        if message.is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }
        let kind = match parts.kind.as_deref() {
            Some(raw) => raw.parse()?,
            None => NotificationKind::default(),
        };
        let scope = if parts.is_global.unwrap_or(true) {
            NotificationScope::Global
        } else {
            let label = parts
                .target_department
                .as_deref()
                .map(str::trim)
                .filter(|label| !label.is_empty())
                .ok_or(NotificationValidationError::MissingTargetDepartment)?;
            let department = label
                .parse()
                .map_err(|_| NotificationValidationError::UnknownDepartment)?;
            NotificationScope::Department(department)
        };
        Ok(Self {
            title: title.to_owned(),
            message: message.to_owned(),
            kind,
            scope,
        })
    }
}
