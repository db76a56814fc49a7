//! Task model.
//!
//! A task is assigned either to a set of individual users or to a whole
//! department, never both; [`Assignment`] encodes that choice structurally.
//! On the wire the assignment is flattened into the `assignedTo` and
//! `assignedDepartment` keys.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::access::Requester;
use super::user::{Department, UserId};

/// Validation errors raised while building or patching tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    InvalidId,
    EmptyTitle,
    EmptyDescription,
    MissingAssignment,
    ConflictingAssignment,
    EmptyAssignees,
    InvalidAssignee,
    UnknownDepartment,
    UnknownStatus,
    UnknownPriority,
    ProgressOutOfRange,
    InvalidDueDate,
    EmptyComment,
    InvalidField { field: String },
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidId => write!(f, "task id must be a valid UUID"),
            Self::EmptyTitle => write!(f, "task title must not be empty"),
            Self::EmptyDescription => write!(f, "task description must not be empty"),
            Self::MissingAssignment => {
                write!(f, "a task must be assigned to employees or to a department")
            }
            Self::ConflictingAssignment => write!(
                f,
                "a task is assigned to employees or to a department, not both"
            ),
            Self::EmptyAssignees => write!(f, "at least one employee must be assigned"),
            Self::InvalidAssignee => write!(f, "assignee ids must be valid UUIDs"),
            Self::UnknownDepartment => write!(f, "department is not recognised"),
            Self::UnknownStatus => {
                write!(f, "status must be pending, in-progress, completed or delayed")
            }
            Self::UnknownPriority => write!(f, "priority must be low, medium or high"),
            Self::ProgressOutOfRange => write!(f, "progress must be an integer between 0 and 100"),
            Self::InvalidDueDate => {
                write!(f, "due date must be an RFC 3339 instant or a YYYY-MM-DD date")
            }
            Self::EmptyComment => write!(f, "comment text must not be empty"),
            Self::InvalidField { field } => write!(f, "field `{field}` has an invalid value"),
        }
    }
}

impl std::error::Error for TaskValidationError {}

/// Stable task identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new(id: impl AsRef<str>) -> Result<Self, TaskValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(TaskValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| TaskValidationError::InvalidId)
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

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Task lifecycle status. Any status may follow any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Delayed,
}

impl TaskStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Delayed];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Delayed => "delayed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = TaskValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(TaskValidationError::UnknownStatus)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Listed from most to least urgent.
    pub const ALL: [Self; 3] = [Self::High, Self::Medium, Self::Low];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Ordering weight: low 1, medium 2, high 3.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = TaskValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or(TaskValidationError::UnknownPriority)
    }
}

/// Who a task is assigned to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// A non-empty, duplicate-free list of users.
    Individuals(Vec<UserId>),
    Department(Department),
}

impl Assignment {
    /// Build an individual assignment, dropping repeated ids.
    pub fn individuals(
        users: impl IntoIterator<Item = UserId>,
    ) -> Result<Self, TaskValidationError> {
        let mut seen = BTreeSet::new();
        let users: Vec<UserId> = users.into_iter().filter(|id| seen.insert(*id)).collect();
        if users.is_empty() {
            return Err(TaskValidationError::EmptyAssignees);
        }
        Ok(Self::Individuals(users))
    }

    /// Resolve creation input where an empty list or blank department counts as absent.
    pub fn from_parts(
        assigned_to: Option<Vec<UserId>>,
        assigned_department: Option<Department>,
    ) -> Result<Self, TaskValidationError> {
        let users = assigned_to.filter(|users| !users.is_empty());
        match (users, assigned_department) {
            (Some(_), Some(_)) => Err(TaskValidationError::ConflictingAssignment),
            (Some(users), None) => Self::individuals(users),
            (None, Some(department)) => Ok(Self::Department(department)),
            (None, None) => Err(TaskValidationError::MissingAssignment),
        }
    }

    pub fn includes_user(&self, user: &UserId) -> bool {
        matches!(self, Self::Individuals(users) if users.contains(user))
    }

    pub fn department(&self) -> Option<Department> {
        match self {
            Self::Department(department) => Some(*department),
            Self::Individuals(_) => None,
        }
    }

    pub fn assignees(&self) -> &[UserId] {
        match self {
            Self::Individuals(users) => users,
            Self::Department(_) => &[],
        }
    }
}

/// Completion percentage in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

impl Progress {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Result<Self, TaskValidationError> {
        if value > Self::MAX {
            return Err(TaskValidationError::ProgressOutOfRange);
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Progress {
    type Error = TaskValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for u8 {
    fn from(value: Progress) -> Self {
        value.0
    }
}

/// Trimmed, non-empty task title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTitle(String);

impl TaskTitle {
    pub fn new(title: impl AsRef<str>) -> Result<Self, TaskValidationError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TaskValidationError::EmptyTitle);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for TaskTitle {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for TaskTitle {
    type Error = TaskValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskTitle> for String {
    fn from(value: TaskTitle) -> Self {
        value.0
    }
}

fn non_empty_description(raw: &str) -> Result<String, TaskValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyDescription);
    }
    Ok(trimmed.to_owned())
}

fn non_empty_comment(raw: &str) -> Result<String, TaskValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyComment);
    }
    Ok(trimmed.to_owned())
}

/// Parse a due date given either as an RFC 3339 instant or a bare calendar
/// date, which is taken as midnight UTC.
///
/// # Examples
/// ```
/// use taskboard::domain::parse_due_date;
///
/// let due = parse_due_date("2025-01-10").unwrap();
/// assert_eq!(due.to_rfc3339(), "2025-01-10T00:00:00+00:00");
/// ```
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, TaskValidationError> {
    let raw = raw.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or(TaskValidationError::InvalidDueDate)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskComment {
    pub text: String,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
}

impl TaskComment {
    pub fn new(
        text: &str,
        author: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<Self, TaskValidationError> {
        Ok(Self {
            text: non_empty_comment(text)?,
            author,
            created_at,
        })
    }
}

/// Comment supplied inside a task patch; omitted metadata is filled in when
/// the patch is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInput {
    pub text: String,
    pub author: Option<UserId>,
    pub created_at: Option<DateTime<Utc>>,
}

impl CommentInput {
    fn stamped(self, editor: UserId, now: DateTime<Utc>) -> TaskComment {
        TaskComment {
            text: self.text,
            author: self.author.unwrap_or(editor),
            created_at: self.created_at.unwrap_or(now),
        }
    }

    fn matches(&self, stored: &TaskComment) -> bool {
        self.text == stored.text
            && self.author.is_none_or(|author| author == stored.author)
            && self.created_at.is_none_or(|at| at == stored.created_at)
    }
}

/// Each entry matching a stored comment keeps that comment's author and
/// time; every other entry belongs to `editor` at `now`.
fn reconcile_comments(
    stored: &[TaskComment],
    inputs: Vec<CommentInput>,
    editor: UserId,
    now: DateTime<Utc>,
) -> Vec<TaskComment> {
    let mut unused: Vec<Option<&TaskComment>> = stored.iter().map(Some).collect();
    inputs
        .into_iter()
        .map(|input| {
            let kept = unused
                .iter_mut()
                .find(|slot| matches!(slot, Some(comment) if input.matches(comment)))
                .and_then(Option::take);
            match kept {
                Some(comment) => comment.clone(),
                None => TaskComment {
                    text: input.text,
                    author: editor,
                    created_at: now,
                },
            }
        })
        .collect()
}

/// Persisted task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TaskDto", into = "TaskDto")]
pub struct Task {
    pub id: TaskId,
    pub title: TaskTitle,
    pub description: String,
    pub assignment: Assignment,
    pub created_by: UserId,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub comments: Vec<TaskComment>,
    pub progress: Progress,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Materialise a draft created by `creator` at `now`.
    pub fn from_draft(id: TaskId, draft: TaskDraft, creator: UserId, now: DateTime<Utc>) -> Self {
        let TaskDraft {
            title,
            description,
            assignment,
            status,
            priority,
            due_date,
            progress,
        } = draft;
        Self {
            id,
            title,
            description,
            assignment,
            created_by: creator,
            status,
            priority,
            due_date,
            comments: Vec::new(),
            progress,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// Apply a validated patch.
    ///
    /// An admin's comment list is taken as sent, with missing authors and
    /// times filled from `editor` and `now`. Anyone else can only keep stored
    /// comments or add their own.
    pub fn apply(&mut self, patch: TaskPatch, editor: &Requester, now: DateTime<Utc>) {
        let TaskPatch {
            title,
            description,
            assignment,
            status,
            priority,
            due_date,
            progress,
            comments,
            ..
        } = patch;
        if let Some(title) = title {
            self.title = title;
        }
        if let Some(description) = description {
            self.description = description;
        }
        if let Some(assignment) = assignment {
            self.assignment = assignment;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(priority) = priority {
            self.priority = priority;
        }
        if let Some(due_date) = due_date {
            self.due_date = due_date;
        }
        if let Some(progress) = progress {
            self.progress = progress;
        }
        if let Some(comments) = comments {
            self.comments = if editor.is_admin() {
                comments
                    .into_iter()
                    .map(|input| input.stamped(editor.id, now))
                    .collect()
            } else {
                reconcile_comments(&self.comments, comments, editor.id, now)
            };
        }
        self.updated_at = now;
    }

    /// Append a comment and bump the modification time.
    pub fn push_comment(&mut self, comment: TaskComment) {
        self.updated_at = comment.created_at;
        self.comments.push(comment);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDto {
    id: TaskId,
    title: TaskTitle,
    description: String,
    #[serde(default)]
    assigned_to: Vec<UserId>,
    #[serde(default)]
    assigned_department: Option<Department>,
    created_by: UserId,
    status: TaskStatus,
    priority: TaskPriority,
    due_date: DateTime<Utc>,
    #[serde(default)]
    comments: Vec<TaskComment>,
    #[serde(default)]
    progress: Progress,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Task> for TaskDto {
    fn from(value: Task) -> Self {
        let (assigned_to, assigned_department) = match value.assignment {
            Assignment::Individuals(users) => (users, None),
            Assignment::Department(department) => (Vec::new(), Some(department)),
        };
        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            assigned_to,
            assigned_department,
            created_by: value.created_by,
            status: value.status,
            priority: value.priority,
            due_date: value.due_date,
            comments: value.comments,
            progress: value.progress,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl TryFrom<TaskDto> for Task {
    type Error = TaskValidationError;

    fn try_from(value: TaskDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
            assignment: Assignment::from_parts(Some(value.assigned_to), value.assigned_department)?,
            created_by: value.created_by,
            status: value.status,
            priority: value.priority,
            due_date: value.due_date,
            comments: value.comments,
            progress: value.progress,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

/// Validated input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: TaskTitle,
    pub description: String,
    pub assignment: Assignment,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub progress: Progress,
}

/// Raw creation fields as received from an inbound adapter.
#[derive(Debug, Clone, Default)]
pub struct TaskDraftParts {
    pub title: String,
    pub description: String,
    pub assigned_to: Option<Vec<String>>,
    pub assigned_department: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due_date: String,
    pub progress: Option<u8>,
}

impl TaskDraft {
    pub fn try_from_parts(parts: TaskDraftParts) -> Result<Self, TaskValidationError> {
        let assigned_to = parts
            .assigned_to
            .map(|ids| parse_user_ids(ids.iter().map(String::as_str)))
            .transpose()?;
        let assigned_department = parts
            .assigned_department
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(parse_department)
            .transpose()?;
        Ok(Self {
            title: TaskTitle::new(&parts.title)?,
            description: non_empty_description(&parts.description)?,
            assignment: Assignment::from_parts(assigned_to, assigned_department)?,
            status: parts
                .status
                .as_deref()
                .map(str::parse::<TaskStatus>)
                .transpose()?
                .unwrap_or_default(),
            priority: parts
                .priority
                .as_deref()
                .map(str::parse::<TaskPriority>)
                .transpose()?
                .unwrap_or_default(),
            due_date: parse_due_date(&parts.due_date)?,
            progress: parts.progress.map(Progress::new).transpose()?.unwrap_or_default(),
        })
    }
}

fn parse_user_ids<'a>(
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<Vec<UserId>, TaskValidationError> {
    ids.into_iter()
        .map(|id| UserId::new(id).map_err(|_| TaskValidationError::InvalidAssignee))
        .collect()
}

fn parse_department(label: &str) -> Result<Department, TaskValidationError> {
    label
        .parse()
        .map_err(|_| TaskValidationError::UnknownDepartment)
}

/// Keys a non-admin may include in a task update.
pub const EMPLOYEE_EDITABLE_FIELDS: [&str; 3] = ["status", "progress", "comments"];

/// Partial task update parsed from a JSON object.
///
/// The set of keys present in the request is kept verbatim so authorization
/// can judge the request as a whole; keys the model does not know are
/// recorded there and otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<TaskTitle>,
    pub description: Option<String>,
    pub assignment: Option<Assignment>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub progress: Option<Progress>,
    pub comments: Option<Vec<CommentInput>>,
    fields: BTreeSet<String>,
}

impl TaskPatch {
    /// Names of every key present in the request body.
    pub fn fields(&self) -> &BTreeSet<String> {
        &self.fields
    }

    /// Keys present in the request that the task model does not define.
    pub fn unknown_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .filter(|field| !KNOWN_PATCH_FIELDS.contains(field))
    }

    pub fn from_json(body: &Map<String, Value>) -> Result<Self, TaskValidationError> {
        let mut patch = Self {
            fields: body.keys().cloned().collect(),
            ..Self::default()
        };

        if let Some(value) = body.get("title") {
            patch.title = Some(TaskTitle::new(expect_str(value, "title")?)?);
        }
        if let Some(value) = body.get("description") {
            patch.description = Some(non_empty_description(expect_str(value, "description")?)?);
        }
        patch.assignment = patch_assignment(body)?;
        if let Some(value) = body.get("status") {
            patch.status = Some(expect_str(value, "status")?.parse()?);
        }
        if let Some(value) = body.get("priority") {
            patch.priority = Some(expect_str(value, "priority")?.parse()?);
        }
        if let Some(value) = body.get("dueDate") {
            patch.due_date = Some(parse_due_date(expect_str(value, "dueDate")?)?);
        }
        if let Some(value) = body.get("progress") {
            patch.progress = Some(parse_progress(value)?);
        }
        if let Some(value) = body.get("comments") {
            patch.comments = Some(parse_comments(value)?);
        }
        Ok(patch)
    }
}

const KNOWN_PATCH_FIELDS: [&str; 9] = [
    "title",
    "description",
    "assignedTo",
    "assignedDepartment",
    "status",
    "priority",
    "dueDate",
    "progress",
    "comments",
];

fn invalid(field: &str) -> TaskValidationError {
    TaskValidationError::InvalidField {
        field: field.to_owned(),
    }
}

fn expect_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, TaskValidationError> {
    value.as_str().ok_or_else(|| invalid(field))
}

fn parse_progress(value: &Value) -> Result<Progress, TaskValidationError> {
    let raw = value
        .as_u64()
        .ok_or(TaskValidationError::ProgressOutOfRange)?;
    let raw = u8::try_from(raw).map_err(|_| TaskValidationError::ProgressOutOfRange)?;
    Progress::new(raw)
}

fn patch_assignment(body: &Map<String, Value>) -> Result<Option<Assignment>, TaskValidationError> {
    let users = match body.get("assignedTo") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => {
            let ids = items
                .iter()
                .map(|item| item.as_str().ok_or(TaskValidationError::InvalidAssignee))
                .collect::<Result<Vec<_>, _>>()?;
            Some(Assignment::individuals(parse_user_ids(ids)?)?)
        }
        Some(_) => return Err(TaskValidationError::EmptyAssignees),
    };
    let department = match body.get("assignedDepartment") {
        None | Some(Value::Null) => None,
        Some(Value::String(label)) if label.trim().is_empty() => None,
        Some(Value::String(label)) => Some(Assignment::Department(parse_department(label)?)),
        Some(_) => return Err(invalid("assignedDepartment")),
    };
    match (users, department) {
        (Some(_), Some(_)) => Err(TaskValidationError::ConflictingAssignment),
        (users, department) => Ok(users.or(department)),
    }
}

fn parse_comments(value: &Value) -> Result<Vec<CommentInput>, TaskValidationError> {
    let Value::Array(items) = value else {
        return Err(invalid("comments"));
    };
    items
        .iter()
        .map(|item| {
            let Value::Object(entry) = item else {
                return Err(invalid("comments"));
            };
            let text = entry
                .get("text")
                .and_then(Value::as_str)
                .ok_or(TaskValidationError::EmptyComment)?;
            let author = entry
                .get("author")
                .and_then(Value::as_str)
                .map(|id| UserId::new(id).map_err(|_| invalid("comments")))
                .transpose()?;
            let created_at = entry
                .get("createdAt")
                .and_then(Value::as_str)
                .map(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|instant| instant.with_timezone(&Utc))
                        .map_err(|_| invalid("comments"))
                })
                .transpose()?;
            Ok(CommentInput {
                text: non_empty_comment(text)?,
                author,
                created_at,
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
