//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when the migrations change.

diesel::table! {
    /// Accounts. `email` is unique and stored normalised.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        password_hash -> Text,
        /// Arabic department label.
        department -> Varchar,
        /// `admin` or `employee`.
        role -> Varchar,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Tasks. Individual assignees live in `task_assignees`; a department
    /// task has `assigned_department` set and no assignee rows.
    tasks (id) {
        id -> Uuid,
        title -> Text,
        description -> Text,
        assigned_department -> Nullable<Varchar>,
        created_by -> Uuid,
        status -> Varchar,
        priority -> Varchar,
        due_date -> Timestamptz,
        progress -> Int2,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    task_assignees (task_id, user_id) {
        task_id -> Uuid,
        user_id -> Uuid,
        /// Order of the assignee within the task.
        position -> Int4,
    }
}

diesel::table! {
    task_comments (task_id, position) {
        task_id -> Uuid,
        position -> Int4,
        body -> Text,
        author -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    notifications (id) {
        id -> Uuid,
        title -> Text,
        message -> Text,
        kind -> Varchar,
        created_by -> Uuid,
        is_global -> Bool,
        target_department -> Nullable<Varchar>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per reader; the primary key collapses duplicate receipts.
    notification_reads (notification_id, user_id) {
        notification_id -> Uuid,
        user_id -> Uuid,
        read_at -> Timestamptz,
    }
}

diesel::joinable!(task_assignees -> tasks (task_id));
diesel::joinable!(task_comments -> tasks (task_id));
diesel::joinable!(notification_reads -> notifications (notification_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    tasks,
    task_assignees,
    task_comments,
    notifications,
    notification_reads,
);
