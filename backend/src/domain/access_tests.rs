//! Coverage for the visibility and authorization rules.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    Assignment, Email, ErrorCode, NotificationDraft, NotificationDraftParts, NotificationId,
    Progress, TaskId, TaskPriority, TaskStatus, TaskTitle, UserName,
};

fn employee(department: Department) -> Requester {
    Requester {
        id: UserId::random(),
        role: Role::Employee,
        department,
    }
}

fn admin() -> Requester {
    Requester {
        id: UserId::random(),
        role: Role::Admin,
        department: Department::Administration,
    }
}

fn task(assignment: Assignment) -> Task {
    let now = Utc
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .expect("valid instant");
    Task {
        id: TaskId::random(),
        title: TaskTitle::new("T").expect("title"),
        description: "d".to_owned(),
        assignment,
        created_by: UserId::random(),
        status: TaskStatus::Pending,
        priority: TaskPriority::High,
        due_date: now,
        comments: Vec::new(),
        progress: Progress::default(),
        created_at: now,
        updated_at: now,
    }
}

fn notification(is_global: bool, target: Option<&str>) -> Notification {
    let draft = NotificationDraft::try_from_parts(NotificationDraftParts {
        title: "t".to_owned(),
        message: "m".to_owned(),
        kind: None,
        is_global: Some(is_global),
        target_department: target.map(str::to_owned),
    })
    .expect("valid draft");
    Notification::from_draft(NotificationId::random(), draft, UserId::random(), Utc::now())
}

fn fields(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|key| (*key).to_owned()).collect()
}

#[fixture]
fn marketer() -> Requester {
    employee(Department::Marketing)
}

#[rstest]
fn employee_sees_own_and_department_tasks(marketer: Requester) {
    let a = task(Assignment::Individuals(vec![marketer.id]));
    let b = task(Assignment::Department(Department::Finance));
    let c = task(Assignment::Department(Department::Marketing));
    let d = task(Assignment::Individuals(vec![UserId::random()]));

    let visibility = TaskVisibility::for_requester(&marketer);
    let visible: Vec<bool> = [&a, &b, &c, &d].iter().map(|t| visibility.admits(t)).collect();

    assert_eq!(visible, vec![true, false, true, false]);
}

#[rstest]
fn admins_see_every_task() {
    let visibility = TaskVisibility::for_requester(&admin());
    assert_eq!(visibility, TaskVisibility::All);
    assert!(visibility.admits(&task(Assignment::Department(Department::Sales))));
}

#[rstest]
fn reading_an_out_of_scope_task_is_forbidden(marketer: Requester) {
    let hidden = task(Assignment::Department(Department::Finance));
    let err = ensure_can_read_task(&marketer, &hidden).expect_err("hidden task");
    assert_eq!(Error::from(err).code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(&["status"])]
#[case(&["status", "progress", "comments"])]
#[case(&[])]
fn employees_may_send_editable_fields(marketer: Requester, #[case] keys: &[&str]) {
    let own = task(Assignment::Department(Department::Marketing));
    assert_eq!(authorize_task_patch(&marketer, &own, &fields(keys)), Ok(()));
}

#[rstest]
fn any_other_field_refuses_the_whole_patch(marketer: Requester) {
    let own = task(Assignment::Department(Department::Marketing));
    let result = authorize_task_patch(&marketer, &own, &fields(&["status", "title", "priority"]));
    assert_eq!(
        result,
        Err(AccessDenied::FieldsNotEditable {
            fields: vec!["priority".to_owned(), "title".to_owned()]
        })
    );
}

#[rstest]
fn employees_cannot_patch_tasks_they_cannot_see(marketer: Requester) {
    let other = task(Assignment::Department(Department::Sales));
    assert_eq!(
        authorize_task_patch(&marketer, &other, &fields(&["status"])),
        Err(AccessDenied::TaskOutOfScope)
    );
}

#[rstest]
fn admins_may_patch_any_field() {
    let any = task(Assignment::Department(Department::Sales));
    assert_eq!(authorize_task_patch(&admin(), &any, &fields(&["title", "dueDate"])), Ok(()));
}

#[rstest]
#[case(notification(true, None), Department::Finance, true)]
#[case(notification(false, Some("الموارد البشرية")), Department::Finance, false)]
#[case(notification(false, Some("الموارد البشرية")), Department::HumanResources, true)]
fn notifications_follow_their_scope(
    #[case] notification: Notification,
    #[case] department: Department,
    #[case] expected: bool,
) {
    let visibility = NotificationVisibility { department };
    assert_eq!(visibility.admits(&notification), expected);
}

#[rstest]
fn admins_get_no_extra_notification_visibility() {
    let targeted = notification(false, Some("المبيعات"));
    let err = ensure_can_read_notification(&admin(), &targeted).expect_err("hidden");
    assert_eq!(Error::from(err).code(), ErrorCode::NotFound);
}

fn user_with(role: Role) -> User {
    User::new(
        UserId::random(),
        UserName::new("n").expect("name"),
        Email::new("n@example.com").expect("email"),
        Department::Administration,
        role,
    )
}

#[rstest]
#[case(Role::Admin, 1, Err(AccessDenied::LastAdmin))]
#[case(Role::Admin, 0, Err(AccessDenied::LastAdmin))]
#[case(Role::Admin, 2, Ok(()))]
#[case(Role::Employee, 1, Ok(()))]
fn the_last_admin_is_protected(
    #[case] role: Role,
    #[case] admin_count: u64,
    #[case] expected: Result<(), AccessDenied>,
) {
    assert_eq!(ensure_admin_remains(&user_with(role), admin_count), expected);
}

#[rstest]
fn last_admin_maps_to_invariant_violation() {
    assert_eq!(Error::from(AccessDenied::LastAdmin).code(), ErrorCode::InvariantViolation);
}

#[rstest]
fn only_admins_pass_the_admin_gate(marketer: Requester) {
    assert_eq!(ensure_admin(&admin()), Ok(()));
    assert_eq!(ensure_admin(&marketer), Err(AccessDenied::AdminOnly));
}
