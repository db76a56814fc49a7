//! Tests for the task service.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::rstest;
use serde_json::json;

use super::*;
use crate::domain::ports::{MockTaskRepository, MockUserRepository};
use crate::domain::{
    Assignment, DashboardPeriod, Email, ErrorCode, Progress, Role, TaskDraftParts, TaskPriority,
    TaskStatus, TaskTitle, User, UserName,
};
use crate::test_support::MutableClock;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 20, 10, 0, 0)
        .single()
        .expect("valid instant")
}

fn make_service(
    tasks: MockTaskRepository,
    users: MockUserRepository,
) -> TaskService<MockTaskRepository, MockUserRepository> {
    TaskService::new(
        Arc::new(tasks),
        Arc::new(users),
        Arc::new(MutableClock::new(now())),
    )
}

fn admin() -> Requester {
    Requester {
        id: UserId::random(),
        role: Role::Admin,
        department: Department::Administration,
    }
}

fn employee(department: Department) -> Requester {
    Requester {
        id: UserId::random(),
        role: Role::Employee,
        department,
    }
}

fn task(assignment: Assignment) -> Task {
    let created = now() - TimeDelta::days(3);
    Task {
        id: TaskId::random(),
        title: TaskTitle::new("Prepare report").expect("title"),
        description: "Monthly numbers".to_owned(),
        assignment,
        created_by: UserId::random(),
        status: TaskStatus::Pending,
        priority: TaskPriority::Medium,
        due_date: now() - TimeDelta::days(1),
        comments: Vec::new(),
        progress: Progress::default(),
        created_at: created,
        updated_at: created,
    }
}

fn body(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

fn repo_holding(existing: Task) -> MockTaskRepository {
    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_find_by_id()
        .returning(move |_| Ok(Some(existing.clone())));
    tasks
}

/// A repository whose `list` evaluates the filter over a fixed set.
fn repo_listing(stored: Vec<Task>) -> MockTaskRepository {
    let mut tasks = MockTaskRepository::new();
    tasks.expect_list().returning(move |filter| {
        Ok(stored
            .iter()
            .filter(|task| filter.matches(task))
            .cloned()
            .collect())
    });
    tasks
}

fn draft() -> TaskDraft {
    TaskDraft::try_from_parts(TaskDraftParts {
        title: "T1".to_owned(),
        description: "Quarterly close".to_owned(),
        assigned_department: Some("المالية".to_owned()),
        due_date: "2025-01-10".to_owned(),
        priority: Some("high".to_owned()),
        ..TaskDraftParts::default()
    })
    .expect("valid draft")
}

#[tokio::test]
async fn admins_create_tasks_stamped_by_the_clock() {
    let requester = admin();
    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_insert()
        .withf(move |task| task.created_by == requester.id && task.created_at == now())
        .times(1)
        .returning(|_| Ok(()));

    let created = make_service(tasks, MockUserRepository::new())
        .create_task(&requester, draft())
        .await
        .expect("created");

    assert_eq!(created.assignment, Assignment::Department(Department::Finance));
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.priority, TaskPriority::High);
    assert_eq!(created.progress.value(), 0);
}

#[tokio::test]
async fn employees_cannot_create_tasks() {
    let mut tasks = MockTaskRepository::new();
    tasks.expect_insert().never();

    let err = make_service(tasks, MockUserRepository::new())
        .create_task(&employee(Department::Finance), draft())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(json!({ "status": "completed", "title": "Renamed" }))]
#[case(json!({ "dueDate": "2025-03-01" }))]
#[case(json!({ "progress": 50, "assignedDepartment": "المالية" }))]
#[tokio::test]
async fn employee_updates_outside_editable_fields_are_refused_whole(#[case] request: Value) {
    let requester = employee(Department::Finance);
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks.expect_update().never();

    let err = make_service(tasks, MockUserRepository::new())
        .update_task(&requester, &TaskId::random(), body(request))
        .await
        .expect_err("refused");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn employee_updates_status_and_progress_of_a_visible_task() {
    let requester = employee(Department::Finance);
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks
        .expect_update()
        .withf(|task| task.status == TaskStatus::InProgress && task.progress.value() == 40)
        .times(1)
        .returning(|_| Ok(true));

    let updated = make_service(tasks, MockUserRepository::new())
        .update_task(
            &requester,
            &TaskId::random(),
            body(json!({ "status": "in-progress", "progress": 40 })),
        )
        .await
        .expect("updated");
    assert_eq!(updated.updated_at, now());
}

#[tokio::test]
async fn employees_cannot_update_tasks_they_cannot_see() {
    let requester = employee(Department::Marketing);
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks.expect_update().never();

    let err = make_service(tasks, MockUserRepository::new())
        .update_task(&requester, &TaskId::random(), body(json!({ "status": "completed" })))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(json!({ "progress": 101 }))]
#[case(json!({ "assignedTo": [] }))]
#[case(json!({ "status": "archived" }))]
#[tokio::test]
async fn invalid_values_are_rejected_after_authorization(#[case] request: Value) {
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks.expect_update().never();

    let err = make_service(tasks, MockUserRepository::new())
        .update_task(&admin(), &TaskId::random(), body(request))
        .await
        .expect_err("invalid");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn admin_may_reassign_and_unknown_keys_are_ignored() {
    let assignee = UserId::random();
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks
        .expect_update()
        .withf(move |task| task.assignment == Assignment::Individuals(vec![assignee]))
        .returning(|_| Ok(true));

    make_service(tasks, MockUserRepository::new())
        .update_task(
            &admin(),
            &TaskId::random(),
            body(json!({ "assignedTo": [assignee.to_string()], "colour": "red" })),
        )
        .await
        .expect("updated");
}

#[tokio::test]
async fn updating_a_missing_task_is_not_found() {
    let mut tasks = MockTaskRepository::new();
    tasks.expect_find_by_id().returning(|_| Ok(None));

    let err = make_service(tasks, MockUserRepository::new())
        .update_task(&admin(), &TaskId::random(), body(json!({ "status": "completed" })))
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn listing_follows_employee_visibility() {
    let requester = employee(Department::Marketing);
    let a = task(Assignment::Individuals(vec![requester.id]));
    let b = task(Assignment::Department(Department::Finance));
    let c = task(Assignment::Department(Department::Marketing));
    let expected: BTreeSet<TaskId> = [a.id, c.id].into_iter().collect();

    let listed = make_service(repo_listing(vec![a, b, c]), MockUserRepository::new())
        .list_tasks(&requester, TaskQuery::default())
        .await
        .expect("listed");

    let ids: BTreeSet<TaskId> = listed.iter().map(|task| task.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn department_filter_matches_individual_assignees_through_the_user_store() {
    let finance_member = UserId::random();
    let other = UserId::random();
    let individual = task(Assignment::Individuals(vec![finance_member]));
    let unrelated = task(Assignment::Individuals(vec![other]));
    let wanted = individual.id;

    let mut users = MockUserRepository::new();
    users.expect_find_many().times(1).returning(move |_| {
        Ok(vec![
            User::new(
                finance_member,
                UserName::new("سارة").expect("name"),
                Email::new("sara@example.com").expect("email"),
                Department::Finance,
                Role::Employee,
            ),
            User::new(
                other,
                UserName::new("عمر").expect("name"),
                Email::new("omar@example.com").expect("email"),
                Department::Sales,
                Role::Employee,
            ),
        ])
    });

    let query = TaskQuery {
        department: Some(Department::Finance),
        ..TaskQuery::default()
    };
    let listed = make_service(repo_listing(vec![individual, unrelated]), users)
        .list_tasks(&admin(), query)
        .await
        .expect("listed");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, wanted);
}

#[tokio::test]
async fn reading_an_invisible_task_is_forbidden() {
    let tasks = repo_holding(task(Assignment::Individuals(vec![UserId::random()])));

    let err = make_service(tasks, MockUserRepository::new())
        .get_task(&employee(Department::Sales), &TaskId::random())
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn comments_are_attributed_to_the_requester() {
    let requester = employee(Department::Finance);
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks.expect_update().times(1).returning(|_| Ok(true));

    let updated = make_service(tasks, MockUserRepository::new())
        .add_comment(&requester, &TaskId::random(), "  on it ".to_owned())
        .await
        .expect("commented");

    let comment = updated.comments.last().expect("one comment");
    assert_eq!(comment.text, "on it");
    assert_eq!(comment.author, requester.id);
    assert_eq!(comment.created_at, now());
}

#[tokio::test]
async fn blank_comments_are_invalid() {
    let mut tasks = repo_holding(task(Assignment::Department(Department::Finance)));
    tasks.expect_update().never();

    let err = make_service(tasks, MockUserRepository::new())
        .add_comment(&admin(), &TaskId::random(), "   ".to_owned())
        .await
        .expect_err("blank");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn deleting_a_missing_task_is_not_found() {
    let mut tasks = MockTaskRepository::new();
    tasks.expect_delete().returning(|_| Ok(false));

    let err = make_service(tasks, MockUserRepository::new())
        .delete_task(&admin(), &TaskId::random())
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn dashboard_aggregates_visible_tasks_inside_the_period() {
    let worker = UserId::random();
    let mut done = task(Assignment::Individuals(vec![worker]));
    done.status = TaskStatus::Completed;
    let mut overdue_last_year = task(Assignment::Individuals(vec![worker]));
    overdue_last_year.due_date = now() - TimeDelta::days(400);

    let mut tasks = MockTaskRepository::new();
    let stored = vec![done, overdue_last_year];
    tasks.expect_list().returning(move |filter| {
        assert_eq!(filter.due.map(|window| window.end), Some(now()));
        Ok(stored.iter().filter(|task| filter.matches(task)).cloned().collect())
    });
    let mut users = MockUserRepository::new();
    users.expect_find_many().returning(move |_| {
        Ok(vec![User::new(
            worker,
            UserName::new("سارة").expect("name"),
            Email::new("sara@example.com").expect("email"),
            Department::Finance,
            Role::Employee,
        )])
    });

    let summary = make_service(tasks, users)
        .dashboard(
            &admin(),
            DashboardRequest {
                period: DashboardPeriod::Month,
                department: None,
            },
        )
        .await
        .expect("summary");

    assert_eq!(summary.stats.total_tasks, 1);
    assert_eq!(summary.stats.completed_tasks, 1);
    let entry = &summary.employee_performance[0];
    assert_eq!(entry.name.as_deref(), Some("سارة"));
    assert_eq!(entry.completion_rate, 100.0);
}

#[tokio::test]
async fn store_outages_surface_as_service_unavailable() {
    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_list()
        .returning(|_| Err(TaskPersistenceError::connection("refused")));

    let err = make_service(tasks, MockUserRepository::new())
        .list_tasks(&admin(), TaskQuery::default())
        .await
        .expect_err("unavailable");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
