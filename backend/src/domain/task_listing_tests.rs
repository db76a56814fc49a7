//! Tests for task list parsing, filtering and ordering.

use chrono::TimeZone;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{Assignment, Progress, TaskId, TaskTitle};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, d, 0, 0, 0)
        .single()
        .expect("valid instant")
}

fn task(title: &str, assignment: Assignment, priority: TaskPriority, created: u32) -> Task {
    Task {
        id: TaskId::random(),
        title: TaskTitle::new(title).expect("title"),
        description: format!("about {title}"),
        assignment,
        created_by: UserId::random(),
        status: TaskStatus::Pending,
        priority,
        due_date: day(created + 5),
        comments: Vec::new(),
        progress: Progress::default(),
        created_at: day(created),
        updated_at: day(created),
    }
}

struct Board {
    tasks: Vec<Task>,
    departments: HashMap<UserId, Department>,
}

#[fixture]
fn board() -> Board {
    let seller = UserId::random();
    let tasks = vec![
        task("Budget", Assignment::Department(Department::Finance), TaskPriority::Low, 1),
        task("Campaign", Assignment::Individuals(vec![seller]), TaskPriority::High, 2),
        task("Audit", Assignment::Department(Department::Sales), TaskPriority::Medium, 3),
    ];
    Board {
        tasks,
        departments: HashMap::from([(seller, Department::Sales)]),
    }
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|task| task.title.as_ref()).collect()
}

#[rstest]
fn defaults_to_newest_first(board: Board) {
    let query = TaskQuery::try_from_parts(&TaskQueryParts::default()).expect("query");
    let result = query.refine(board.tasks, &board.departments);
    assert_eq!(titles(&result), vec!["Audit", "Campaign", "Budget"]);
}

#[rstest]
fn department_matches_department_tasks_and_assignees(board: Board) {
    let parts = TaskQueryParts {
        department: Some("المبيعات".to_owned()),
        sort_order: Some("asc".to_owned()),
        ..TaskQueryParts::default()
    };
    let query = TaskQuery::try_from_parts(&parts).expect("query");
    assert!(query.needs_assignee_departments());
    let result = query.refine(board.tasks, &board.departments);
    assert_eq!(titles(&result), vec!["Campaign", "Audit"]);
}

#[rstest]
#[case("BUD", vec!["Budget"])]
#[case("about a", vec!["Audit"])]
fn search_is_case_insensitive_over_title_and_description(
    board: Board,
    #[case] needle: &str,
    #[case] expected: Vec<&str>,
) {
    let parts = TaskQueryParts {
        search: Some(needle.to_owned()),
        ..TaskQueryParts::default()
    };
    let query = TaskQuery::try_from_parts(&parts).expect("query");
    let result = query.refine(board.tasks, &board.departments);
    assert_eq!(titles(&result), expected);
}

#[rstest]
#[case("priority", "desc", vec!["Campaign", "Audit", "Budget"])]
#[case("priority", "asc", vec!["Budget", "Audit", "Campaign"])]
#[case("title", "asc", vec!["Audit", "Budget", "Campaign"])]
#[case("dueDate", "asc", vec!["Budget", "Campaign", "Audit"])]
fn sorts_by_the_requested_key(
    board: Board,
    #[case] sort_by: &str,
    #[case] order: &str,
    #[case] expected: Vec<&str>,
) {
    let parts = TaskQueryParts {
        sort_by: Some(sort_by.to_owned()),
        sort_order: Some(order.to_owned()),
        ..TaskQueryParts::default()
    };
    let query = TaskQuery::try_from_parts(&parts).expect("query");
    let result = query.refine(board.tasks, &board.departments);
    assert_eq!(titles(&result), expected);
}

#[rstest]
fn due_window_needs_both_ends() {
    let only_start = TaskQueryParts {
        start_date: Some("2025-01-01".to_owned()),
        ..TaskQueryParts::default()
    };
    assert_eq!(TaskQuery::try_from_parts(&only_start).expect("query").due, None);

    let both = TaskQueryParts {
        end_date: Some("2025-01-07".to_owned()),
        ..only_start
    };
    let window = TaskQuery::try_from_parts(&both).expect("query").due.expect("window");
    assert!(window.contains(day(7)));
    assert!(!window.contains(day(8)));
}

#[rstest]
fn store_filter_combines_visibility_and_fields(board: Board) {
    let parts = TaskQueryParts {
        priority: Some("high".to_owned()),
        ..TaskQueryParts::default()
    };
    let query = TaskQuery::try_from_parts(&parts).expect("query");
    let filter = query.store_filter(TaskVisibility::All);
    let matched: Vec<&Task> = board.tasks.iter().filter(|t| filter.matches(t)).collect();
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title.as_ref(), "Campaign");
}

#[rstest]
#[case(TaskQueryParts { status: Some("all".into()), department: Some(" ".into()), ..TaskQueryParts::default() }, true)]
#[case(TaskQueryParts { status: Some("archived".into()), ..TaskQueryParts::default() }, false)]
#[case(TaskQueryParts { sort_by: Some("owner".into()), ..TaskQueryParts::default() }, false)]
#[case(TaskQueryParts { department: Some("Finance".into()), ..TaskQueryParts::default() }, false)]
fn parsing_accepts_placeholders_and_rejects_unknown_values(
    #[case] parts: TaskQueryParts,
    #[case] ok: bool,
) {
    assert_eq!(TaskQuery::try_from_parts(&parts).is_ok(), ok);
}
