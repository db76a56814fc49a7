//! Tests for the notification service.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use rstest::rstest;

use super::*;
use crate::domain::ports::MockNotificationRepository;
use crate::domain::{
    Department, ErrorCode, NotificationDraftParts, NotificationKind, NotificationScope, Role,
    UserId,
};
use crate::test_support::MutableClock;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0)
        .single()
        .expect("valid instant")
}

fn make_service(repo: MockNotificationRepository) -> NotificationService<MockNotificationRepository> {
    NotificationService::new(Arc::new(repo), Arc::new(MutableClock::new(now())))
}

fn requester(role: Role, department: Department) -> Requester {
    Requester {
        id: UserId::random(),
        role,
        department,
    }
}

fn draft(scope: NotificationScope) -> NotificationDraft {
    NotificationDraft {
        title: "Maintenance".to_owned(),
        message: "Servers restart tonight".to_owned(),
        kind: NotificationKind::Warning,
        scope,
    }
}

fn notification(scope: NotificationScope) -> Notification {
    Notification::from_draft(
        NotificationId::random(),
        draft(scope),
        UserId::random(),
        now() - TimeDelta::hours(1),
    )
}

fn holding(existing: Notification) -> MockNotificationRepository {
    let mut repo = MockNotificationRepository::new();
    repo.expect_find_by_id()
        .returning(move |_| Ok(Some(existing.clone())));
    repo
}

#[tokio::test]
async fn admins_create_department_notifications() {
    let admin = requester(Role::Admin, Department::Administration);
    let draft = NotificationDraft::try_from_parts(NotificationDraftParts {
        title: "Payroll".to_owned(),
        message: "Submit timesheets".to_owned(),
        is_global: Some(false),
        target_department: Some("الموارد البشرية".to_owned()),
        ..NotificationDraftParts::default()
    })
    .expect("valid draft");
    let mut repo = MockNotificationRepository::new();
    repo.expect_insert().times(1).returning(|_| Ok(()));

    let created = make_service(repo)
        .create_notification(&admin, draft)
        .await
        .expect("created");

    assert_eq!(
        created.scope,
        NotificationScope::Department(Department::HumanResources)
    );
    assert_eq!(created.kind, NotificationKind::Info);
    assert_eq!(created.created_by, admin.id);
    assert!(created.read_by().is_empty());
}

#[tokio::test]
async fn employees_cannot_create_or_delete() {
    let employee = requester(Role::Employee, Department::Sales);
    let mut repo = MockNotificationRepository::new();
    repo.expect_insert().never();
    repo.expect_delete().never();
    let service = make_service(repo);

    let created = service
        .create_notification(&employee, draft(NotificationScope::Global))
        .await
        .expect_err("forbidden");
    let deleted = service
        .delete_notification(&employee, &NotificationId::random())
        .await
        .expect_err("forbidden");

    assert_eq!(created.code(), ErrorCode::Forbidden);
    assert_eq!(deleted.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn marking_read_appends_one_receipt() {
    let reader = requester(Role::Employee, Department::Finance);
    let mut repo = holding(notification(NotificationScope::Global));
    repo.expect_append_read_receipt()
        .withf(move |_, receipt| receipt.user == reader.id && receipt.read_at == now())
        .times(1)
        .returning(|_, _| Ok(true));

    let receipt = make_service(repo)
        .mark_read(&reader, &NotificationId::random())
        .await
        .expect("marked");
    assert_eq!(receipt.read_at, now());
}

#[tokio::test]
async fn marking_read_again_keeps_the_first_receipt() {
    let reader = requester(Role::Employee, Department::Finance);
    let earlier = now() - TimeDelta::minutes(30);
    let stored = notification(NotificationScope::Global).with_receipts([ReadReceipt {
        user: reader.id,
        read_at: earlier,
    }]);
    let mut repo = holding(stored);
    repo.expect_append_read_receipt().never();

    let receipt = make_service(repo)
        .mark_read(&reader, &NotificationId::random())
        .await
        .expect("idempotent");
    assert_eq!(receipt.read_at, earlier);
}

#[tokio::test]
async fn a_lost_race_reports_the_stored_receipt() {
    let reader = requester(Role::Employee, Department::Finance);
    let winner = now() - TimeDelta::seconds(1);
    let fresh = notification(NotificationScope::Global);
    let raced = fresh.clone().with_receipts([ReadReceipt {
        user: reader.id,
        read_at: winner,
    }]);

    let mut repo = MockNotificationRepository::new();
    let mut seq = mockall::Sequence::new();
    repo.expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(fresh)));
    repo.expect_append_read_receipt()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(false));
    repo.expect_find_by_id()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(raced)));

    let receipt = make_service(repo)
        .mark_read(&reader, &NotificationId::random())
        .await
        .expect("marked");
    assert_eq!(receipt.read_at, winner);
}

#[rstest]
#[case(Role::Employee)]
#[case(Role::Admin)]
#[tokio::test]
async fn notifications_for_other_departments_read_as_missing(#[case] role: Role) {
    let reader = requester(role, Department::Finance);
    let mut repo = holding(notification(NotificationScope::Department(
        Department::HumanResources,
    )));
    repo.expect_append_read_receipt().never();

    let err = make_service(repo)
        .mark_read(&reader, &NotificationId::random())
        .await
        .expect_err("hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn listing_marks_each_entry_for_the_reader() {
    let reader = requester(Role::Employee, Department::Finance);
    let read = notification(NotificationScope::Global).with_receipts([ReadReceipt {
        user: reader.id,
        read_at: now(),
    }]);
    let unread = notification(NotificationScope::Department(Department::Finance));
    let mut repo = MockNotificationRepository::new();
    repo.expect_list()
        .withf(|visibility| visibility.department == Department::Finance)
        .returning(move |_| Ok(vec![read.clone(), unread.clone()]));

    let views = make_service(repo)
        .list_notifications(&reader)
        .await
        .expect("listed");

    let flags: Vec<(bool, Option<DateTime<Utc>>)> =
        views.iter().map(|view| (view.is_read, view.read_at)).collect();
    assert_eq!(flags, vec![(true, Some(now())), (false, None)]);
}

#[tokio::test]
async fn unread_count_is_scoped_to_the_reader() {
    let reader = requester(Role::Employee, Department::Sales);
    let reader_id = reader.id;
    let mut repo = MockNotificationRepository::new();
    repo.expect_count_unread()
        .withf(move |visibility, user| {
            visibility.department == Department::Sales && *user == reader_id
        })
        .returning(|_, _| Ok(3));

    let count = make_service(repo).unread_count(&reader).await.expect("count");
    assert_eq!(count, 3);
}

#[tokio::test]
async fn deleting_a_missing_notification_is_not_found() {
    let mut repo = MockNotificationRepository::new();
    repo.expect_delete().returning(|_| Ok(false));

    let err = make_service(repo)
        .delete_notification(
            &requester(Role::Admin, Department::Administration),
            &NotificationId::random(),
        )
        .await
        .expect_err("missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
