//! Shared validation helpers for inbound HTTP adapters.
//!
//! Domain validation enums carry no notion of wire field names; the helpers
//! here attach `{ field, code }` details so clients can highlight the
//! offending input.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::domain::{
    CredentialsValidationError, Error, NotificationId, NotificationValidationError, TaskId,
    TaskValidationError, UnknownPeriod, UserId, UserValidationError,
};

/// Newtype wrapper for HTTP field names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

fn field_error(field: FieldName, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code,
    }))
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field_name = field.as_str();
    Error::invalid_request(format!("{field_name} must be a valid UUID")).with_details(json!({
        "field": field_name,
        "value": value,
        "code": "invalid_uuid",
    }))
}

/// Decode a body that was accepted as raw JSON so the handler could check
/// permissions first.
pub(crate) fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, Error> {
    serde_json::from_value(body)
        .map_err(|err| Error::invalid_request(format!("invalid JSON body: {err}")))
}

pub(crate) fn parse_user_id(value: &str) -> Result<UserId, Error> {
    UserId::new(value).map_err(|_| invalid_uuid_error(FieldName::new("id"), value))
}

pub(crate) fn parse_task_id(value: &str) -> Result<TaskId, Error> {
    TaskId::new(value).map_err(|_| invalid_uuid_error(FieldName::new("id"), value))
}

pub(crate) fn parse_notification_id(value: &str) -> Result<NotificationId, Error> {
    NotificationId::new(value).map_err(|_| invalid_uuid_error(FieldName::new("id"), value))
}

pub(crate) fn user_error(err: UserValidationError) -> Error {
    let (field, code) = match err {
        UserValidationError::InvalidId => ("id", "invalid_uuid"),
        UserValidationError::EmptyName => ("name", "empty_name"),
        UserValidationError::NameTooLong { .. } => ("name", "name_too_long"),
        UserValidationError::EmptyEmail => ("email", "empty_email"),
        UserValidationError::InvalidEmail => ("email", "invalid_email"),
        UserValidationError::UnknownDepartment => ("department", "unknown_department"),
        UserValidationError::UnknownRole => ("role", "unknown_role"),
    };
    field_error(FieldName::new(field), code, err.to_string())
}

pub(crate) fn credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::User(inner) => user_error(inner),
        CredentialsValidationError::EmptyPassword => {
            field_error(FieldName::new("password"), "empty_password", err.to_string())
        }
        CredentialsValidationError::PasswordTooShort { .. } => {
            field_error(FieldName::new("password"), "password_too_short", err.to_string())
        }
    }
}

pub(crate) fn task_error(err: TaskValidationError) -> Error {
    let field = match &err {
        TaskValidationError::InvalidId => "id",
        TaskValidationError::EmptyTitle => "title",
        TaskValidationError::EmptyDescription => "description",
        TaskValidationError::MissingAssignment
        | TaskValidationError::ConflictingAssignment
        | TaskValidationError::EmptyAssignees
        | TaskValidationError::InvalidAssignee => "assignedTo",
        TaskValidationError::UnknownDepartment => "department",
        TaskValidationError::UnknownStatus => "status",
        TaskValidationError::UnknownPriority => "priority",
        TaskValidationError::ProgressOutOfRange => "progress",
        TaskValidationError::InvalidDueDate => "dueDate",
        TaskValidationError::EmptyComment => "text",
        TaskValidationError::InvalidField { field } => {
            return Error::invalid_request(err.to_string()).with_details(json!({
                "field": field,
                "code": "invalid_value",
            }));
        }
    };
    field_error(FieldName::new(field), "invalid_value", err.to_string())
}

pub(crate) fn notification_error(err: NotificationValidationError) -> Error {
    let field = match err {
        NotificationValidationError::InvalidId => "id",
        NotificationValidationError::EmptyTitle => "title",
        NotificationValidationError::EmptyMessage => "message",
        NotificationValidationError::UnknownKind => "type",
        NotificationValidationError::MissingTargetDepartment
        | NotificationValidationError::UnknownDepartment => "targetDepartment",
    };
    field_error(FieldName::new(field), "invalid_value", err.to_string())
}

pub(crate) fn period_error(err: UnknownPeriod) -> Error {
    field_error(FieldName::new("period"), "invalid_value", err.to_string())
}
