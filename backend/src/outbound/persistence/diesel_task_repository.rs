//! PostgreSQL-backed `TaskRepository` implementation using Diesel ORM.
//!
//! A task spans three tables: the `tasks` row, its ordered individual
//! assignees and its ordered comments. Writes replace all three inside one
//! transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{TaskPersistenceError, TaskRepository};
use crate::domain::{
    Assignment, Department, Progress, Task, TaskComment, TaskFilter, TaskId, TaskTitle,
    TaskVisibility, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{TaskAssigneeRow, TaskCommentRow, TaskRecord, TaskRow};
use super::pool::{DbPool, PoolError};
use super::schema::{task_assignees, task_comments, tasks};

/// Diesel-backed implementation of the `TaskRepository` port.
#[derive(Clone)]
pub struct DieselTaskRepository {
    pool: DbPool,
}

impl DieselTaskRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> TaskPersistenceError {
    map_basic_pool_error(error, TaskPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> TaskPersistenceError {
    map_basic_diesel_error(
        error,
        TaskPersistenceError::query,
        TaskPersistenceError::connection,
    )
}

fn position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn record(task: &Task) -> TaskRecord<'_> {
    TaskRecord {
        id: *task.id.as_uuid(),
        title: task.title.as_ref(),
        description: &task.description,
        assigned_department: task.assignment.department().map(|department| department.label()),
        created_by: *task.created_by.as_uuid(),
        status: task.status.as_str(),
        priority: task.priority.as_str(),
        due_date: task.due_date,
        progress: i16::from(task.progress.value()),
        created_at: task.created_at,
        updated_at: task.updated_at,
    }
}

fn child_rows(task: &Task) -> (Vec<TaskAssigneeRow>, Vec<TaskCommentRow>) {
    let task_id = *task.id.as_uuid();
    let assignees = task
        .assignment
        .assignees()
        .iter()
        .enumerate()
        .map(|(index, user)| TaskAssigneeRow {
            task_id,
            user_id: *user.as_uuid(),
            position: position(index),
        })
        .collect();
    let comments = task
        .comments
        .iter()
        .enumerate()
        .map(|(index, comment)| TaskCommentRow {
            task_id,
            position: position(index),
            body: comment.text.clone(),
            author: *comment.author.as_uuid(),
            created_at: comment.created_at,
        })
        .collect();
    (assignees, comments)
}

/// Rebuild a domain task from its rows; children are ordered by `position`.
fn assemble(
    row: TaskRow,
    mut assignees: Vec<TaskAssigneeRow>,
    mut comments: Vec<TaskCommentRow>,
) -> Result<Task, TaskPersistenceError> {
    assignees.sort_by_key(|assignee| assignee.position);
    comments.sort_by_key(|comment| comment.position);
    let corrupt = |field: &str| {
        warn!(task_id = %row.id, field, "stored task row failed validation");
        TaskPersistenceError::query(format!("stored task has invalid {field}"))
    };
    let department = row
        .assigned_department
        .as_deref()
        .map(str::parse::<Department>)
        .transpose()
        .map_err(|_| corrupt("assigned_department"))?;
    let users: Vec<UserId> = assignees
        .iter()
        .map(|assignee| UserId::from_uuid(assignee.user_id))
        .collect();
    let assignment = Assignment::from_parts(Some(users), department)
        .map_err(|_| corrupt("assignment"))?;
    let progress = u8::try_from(row.progress)
        .ok()
        .and_then(|value| Progress::new(value).ok())
        .ok_or_else(|| corrupt("progress"))?;
    Ok(Task {
        id: TaskId::from_uuid(row.id),
        title: TaskTitle::new(&row.title).map_err(|_| corrupt("title"))?,
        description: row.description.clone(),
        assignment,
        created_by: UserId::from_uuid(row.created_by),
        status: row.status.parse().map_err(|_| corrupt("status"))?,
        priority: row.priority.parse().map_err(|_| corrupt("priority"))?,
        due_date: row.due_date,
        comments: comments
            .into_iter()
            .map(|comment| TaskComment {
                text: comment.body,
                author: UserId::from_uuid(comment.author),
                created_at: comment.created_at,
            })
            .collect(),
        progress,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

/// Load children for `rows` and assemble tasks in row order.
async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<TaskRow>,
) -> Result<Vec<Task>, TaskPersistenceError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let assignee_rows: Vec<TaskAssigneeRow> = task_assignees::table
        .filter(task_assignees::task_id.eq_any(&ids))
        .order_by((task_assignees::task_id, task_assignees::position))
        .select(TaskAssigneeRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let comment_rows: Vec<TaskCommentRow> = task_comments::table
        .filter(task_comments::task_id.eq_any(&ids))
        .order_by((task_comments::task_id, task_comments::position))
        .select(TaskCommentRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut assignees: HashMap<Uuid, Vec<TaskAssigneeRow>> = HashMap::new();
    for row in assignee_rows {
        assignees.entry(row.task_id).or_default().push(row);
    }
    let mut comments: HashMap<Uuid, Vec<TaskCommentRow>> = HashMap::new();
    for row in comment_rows {
        comments.entry(row.task_id).or_default().push(row);
    }

    rows.into_iter()
        .map(|row| {
            let own_assignees = assignees.remove(&row.id).unwrap_or_default();
            let own_comments = comments.remove(&row.id).unwrap_or_default();
            assemble(row, own_assignees, own_comments)
        })
        .collect()
}

async fn replace_children(
    conn: &mut AsyncPgConnection,
    task_id: Uuid,
    assignees: &[TaskAssigneeRow],
    comments: &[TaskCommentRow],
) -> Result<(), diesel::result::Error> {
    diesel::delete(task_assignees::table.filter(task_assignees::task_id.eq(task_id)))
        .execute(conn)
        .await?;
    diesel::delete(task_comments::table.filter(task_comments::task_id.eq(task_id)))
        .execute(conn)
        .await?;
    if !assignees.is_empty() {
        diesel::insert_into(task_assignees::table)
            .values(assignees)
            .execute(conn)
            .await?;
    }
    if !comments.is_empty() {
        diesel::insert_into(task_comments::table)
            .values(comments)
            .execute(conn)
            .await?;
    }
    Ok(())
}

#[async_trait]
impl TaskRepository for DieselTaskRepository {
    async fn insert(&self, task: &Task) -> Result<(), TaskPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = record(task);
        let (assignees, comments) = child_rows(task);
        conn.transaction(|conn| {
            async move {
                diesel::insert_into(tasks::table)
                    .values(&row)
                    .execute(conn)
                    .await?;
                replace_children(conn, row.id, &assignees, &comments).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn find_by_id(&self, id: &TaskId) -> Result<Option<Task>, TaskPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<TaskRow> = tasks::table
            .filter(tasks::id.eq(id.as_uuid()))
            .select(TaskRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(hydrate(&mut conn, vec![row]).await?.pop())
    }

    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>, TaskPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = tasks::table.select(TaskRow::as_select()).into_boxed();

        if let TaskVisibility::Scoped { user, department } = filter.visibility {
            let assigned = task_assignees::table
                .filter(task_assignees::user_id.eq(*user.as_uuid()))
                .select(task_assignees::task_id);
            query = query.filter(
                tasks::assigned_department
                    .eq(department.label())
                    .or(tasks::id.eq_any(assigned)),
            );
        }
        if let Some(status) = filter.status {
            query = query.filter(tasks::status.eq(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            query = query.filter(tasks::priority.eq(priority.as_str()));
        }
        if let Some(window) = filter.due {
            query = query.filter(tasks::due_date.between(window.start, window.end));
        }

        let rows: Vec<TaskRow> = query
            .order_by((tasks::created_at.desc(), tasks::id.asc()))
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn update(&self, task: &Task) -> Result<bool, TaskPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = record(task);
        let (assignees, comments) = child_rows(task);
        conn.transaction(|conn| {
            async move {
                let touched = diesel::update(tasks::table.filter(tasks::id.eq(row.id)))
                    .set(&row)
                    .execute(conn)
                    .await?;
                if touched == 0 {
                    return Ok(false);
                }
                replace_children(conn, row.id, &assignees, &comments).await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete(&self, id: &TaskId) -> Result<bool, TaskPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(tasks::table.filter(tasks::id.eq(id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}
