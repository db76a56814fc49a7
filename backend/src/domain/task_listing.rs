//! Task list filtering and ordering.
//!
//! [`TaskFilter`] holds the predicates a store can evaluate on its own;
//! [`TaskQuery`] adds the ones that need assignee details (department) or
//! free text, plus the requested order.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::access::TaskVisibility;
use super::task::{Task, TaskPriority, TaskStatus, TaskValidationError, parse_due_date};
use super::user::{Department, UserId};

/// Inclusive due-date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DueWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Store-level task predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskFilter {
    pub visibility: TaskVisibility,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due: Option<DueWindow>,
}

impl TaskFilter {
    pub fn visible(visibility: TaskVisibility) -> Self {
        Self {
            visibility,
            status: None,
            priority: None,
            due: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.visibility.admits(task)
            && self.status.is_none_or(|status| task.status == status)
            && self.priority.is_none_or(|priority| task.priority == priority)
            && self.due.is_none_or(|window| window.contains(task.due_date))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSortKey {
    Title,
    Priority,
    Status,
    DueDate,
    #[default]
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Client-facing list criteria on top of the visibility filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due: Option<DueWindow>,
    pub department: Option<Department>,
    /// Lowercased search needle.
    pub search: Option<String>,
    pub sort_by: TaskSortKey,
    pub order: SortOrder,
}

/// Raw query-string values.
#[derive(Debug, Clone, Default)]
pub struct TaskQueryParts {
    pub status: Option<String>,
    pub priority: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub department: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "all")
}

impl TaskQuery {
    /// Parse query-string values. The due window applies only when both ends
    /// are given; `all` and blank values mean "no filter".
    pub fn try_from_parts(parts: &TaskQueryParts) -> Result<Self, TaskValidationError> {
        let due = match (present(&parts.start_date), present(&parts.end_date)) {
            (Some(start), Some(end)) => Some(DueWindow {
                start: parse_due_date(start)?,
                end: parse_due_date(end)?,
            }),
            _ => None,
        };
        let sort_by = match present(&parts.sort_by) {
            None => TaskSortKey::default(),
            Some("title") => TaskSortKey::Title,
            Some("priority") => TaskSortKey::Priority,
            Some("status") => TaskSortKey::Status,
            Some("dueDate") => TaskSortKey::DueDate,
            Some("createdAt") => TaskSortKey::CreatedAt,
            Some(_) => {
                return Err(TaskValidationError::InvalidField {
                    field: "sortBy".to_owned(),
                });
            }
        };
        let order = match present(&parts.sort_order) {
            None => SortOrder::default(),
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => {
                return Err(TaskValidationError::InvalidField {
                    field: "sortOrder".to_owned(),
                });
            }
        };
        Ok(Self {
            status: present(&parts.status)
                .map(str::parse::<TaskStatus>)
                .transpose()?,
            priority: present(&parts.priority)
                .map(str::parse::<TaskPriority>)
                .transpose()?,
            due,
            department: present(&parts.department)
                .map(|label| {
                    label
                        .parse::<Department>()
                        .map_err(|_| TaskValidationError::UnknownDepartment)
                })
                .transpose()?,
            search: present(&parts.search).map(str::to_lowercase),
            sort_by,
            order,
        })
    }

    /// The part of this query a store can evaluate.
    pub fn store_filter(&self, visibility: TaskVisibility) -> TaskFilter {
        TaskFilter {
            visibility,
            status: self.status,
            priority: self.priority,
            due: self.due,
        }
    }

    /// Whether any assignee department lookups are needed.
    pub fn needs_assignee_departments(&self) -> bool {
        self.department.is_some()
    }

    /// Apply the department and search predicates, then order the result.
    pub fn refine(
        &self,
        tasks: Vec<Task>,
        assignee_departments: &HashMap<UserId, Department>,
    ) -> Vec<Task> {
        let mut tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|task| self.matches_department(task, assignee_departments))
            .filter(|task| self.matches_search(task))
            .collect();
        self.sort(&mut tasks);
        tasks
    }

    fn matches_department(
        &self,
        task: &Task,
        assignee_departments: &HashMap<UserId, Department>,
    ) -> bool {
        let Some(department) = self.department else {
            return true;
        };
        task.assignment.department() == Some(department)
            || task
                .assignment
                .assignees()
                .iter()
                .any(|user| assignee_departments.get(user) == Some(&department))
    }

    fn matches_search(&self, task: &Task) -> bool {
        let Some(needle) = self.search.as_deref() else {
            return true;
        };
        task.title.as_ref().to_lowercase().contains(needle)
            || task.description.to_lowercase().contains(needle)
    }

    /// Stable sort; ties keep their incoming order.
    pub fn sort(&self, tasks: &mut [Task]) {
        let compare = |a: &Task, b: &Task| -> Ordering {
            match self.sort_by {
                TaskSortKey::Title => a.title.as_ref().cmp(b.title.as_ref()),
                TaskSortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
                TaskSortKey::Status => a.status.as_str().cmp(b.status.as_str()),
                TaskSortKey::DueDate => a.due_date.cmp(&b.due_date),
                TaskSortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            }
        };
        match self.order {
            SortOrder::Asc => tasks.sort_by(compare),
            SortOrder::Desc => tasks.sort_by(|a, b| compare(b, a)),
        }
    }
}

#[cfg(test)]
#[path = "task_listing_tests.rs"]
mod tests;
