//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.
//!
//! Read receipts live in `notification_reads`, keyed by notification and
//! user, so concurrent duplicate marks collapse in the database.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::dsl::not;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use crate::domain::ports::{NotificationPersistenceError, NotificationRepository};
use crate::domain::{
    Department, Notification, NotificationDraft, NotificationId, NotificationScope,
    NotificationVisibility, ReadReceipt, UserId,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewNotificationRow, NotificationReadRow, NotificationRow};
use super::pool::{DbPool, PoolError};
use super::schema::{notification_reads, notifications};

/// Diesel-backed implementation of the `NotificationRepository` port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> NotificationPersistenceError {
    map_basic_pool_error(error, NotificationPersistenceError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> NotificationPersistenceError {
    map_basic_diesel_error(
        error,
        NotificationPersistenceError::query,
        NotificationPersistenceError::connection,
    )
}

fn record(notification: &Notification) -> NewNotificationRow<'_> {
    NewNotificationRow {
        id: *notification.id.as_uuid(),
        title: &notification.title,
        message: &notification.message,
        kind: notification.kind.as_str(),
        created_by: *notification.created_by.as_uuid(),
        is_global: notification.scope.is_global(),
        target_department: notification
            .scope
            .target_department()
            .map(|department| department.label()),
        created_at: notification.created_at,
        updated_at: notification.updated_at,
    }
}

/// Rebuild a notification from its row and receipts. Receipts must be
/// ordered by `read_at`; only a user's earliest one is kept.
fn assemble(
    row: NotificationRow,
    reads: Vec<NotificationReadRow>,
) -> Result<Notification, NotificationPersistenceError> {
    let corrupt = |field: &str| {
        warn!(notification_id = %row.id, field, "stored notification failed validation");
        NotificationPersistenceError::query(format!("stored notification has invalid {field}"))
    };
    let scope = match (row.is_global, row.target_department.as_deref()) {
        (true, _) => NotificationScope::Global,
        (false, Some(label)) => NotificationScope::Department(
            label
                .parse::<Department>()
                .map_err(|_| corrupt("target_department"))?,
        ),
        (false, None) => return Err(corrupt("target_department")),
    };
    let draft = NotificationDraft {
        title: row.title.clone(),
        message: row.message.clone(),
        kind: row.kind.parse().map_err(|_| corrupt("kind"))?,
        scope,
    };
    let mut notification = Notification::from_draft(
        NotificationId::from_uuid(row.id),
        draft,
        UserId::from_uuid(row.created_by),
        row.created_at,
    );
    notification.updated_at = row.updated_at;
    Ok(notification.with_receipts(reads.into_iter().map(|read| ReadReceipt {
        user: UserId::from_uuid(read.user_id),
        read_at: read.read_at,
    })))
}

async fn hydrate(
    conn: &mut AsyncPgConnection,
    rows: Vec<NotificationRow>,
) -> Result<Vec<Notification>, NotificationPersistenceError> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let read_rows: Vec<NotificationReadRow> = notification_reads::table
        .filter(notification_reads::notification_id.eq_any(&ids))
        .order_by((notification_reads::notification_id, notification_reads::read_at))
        .select(NotificationReadRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let mut reads: HashMap<Uuid, Vec<NotificationReadRow>> = HashMap::new();
    for read in read_rows {
        reads.entry(read.notification_id).or_default().push(read);
    }
    rows.into_iter()
        .map(|row| {
            let own = reads.remove(&row.id).unwrap_or_default();
            assemble(row, own)
        })
        .collect()
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<(), NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = record(notification);
        diesel::insert_into(notifications::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<NotificationRow> = notifications::table
            .filter(notifications::id.eq(id.as_uuid()))
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(hydrate(&mut conn, vec![row]).await?.pop())
    }

    async fn list(
        &self,
        visibility: &NotificationVisibility,
    ) -> Result<Vec<Notification>, NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(
                notifications::is_global
                    .eq(true)
                    .or(notifications::target_department.eq(visibility.department.label())),
            )
            .order_by((notifications::created_at.desc(), notifications::id.asc()))
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        hydrate(&mut conn, rows).await
    }

    async fn append_read_receipt(
        &self,
        id: &NotificationId,
        receipt: &ReadReceipt,
    ) -> Result<bool, NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NotificationReadRow {
            notification_id: *id.as_uuid(),
            user_id: *receipt.user.as_uuid(),
            read_at: receipt.read_at,
        };
        let written = diesel::insert_into(notification_reads::table)
            .values(&row)
            .on_conflict((notification_reads::notification_id, notification_reads::user_id))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if written > 0 {
            diesel::update(notifications::table.filter(notifications::id.eq(id.as_uuid())))
                .set(notifications::updated_at.eq(receipt.read_at))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        }
        Ok(written > 0)
    }

    async fn count_unread(
        &self,
        visibility: &NotificationVisibility,
        user: &UserId,
    ) -> Result<u64, NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let read_by_user = notification_reads::table
            .filter(notification_reads::user_id.eq(*user.as_uuid()))
            .select(notification_reads::notification_id);
        let count: i64 = notifications::table
            .filter(
                notifications::is_global
                    .eq(true)
                    .or(notifications::target_department.eq(visibility.department.label())),
            )
            .filter(not(notifications::id.eq_any(read_by_user)))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, NotificationPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed =
            diesel::delete(notifications::table.filter(notifications::id.eq(id.as_uuid())))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }
}
