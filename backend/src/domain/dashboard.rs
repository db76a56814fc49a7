//! Dashboard aggregation.
//!
//! Pure functions over a task set that has already passed the requester's
//! visibility filter. Nothing here is stored; summaries are recomputed on
//! each request.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskPriority, TaskStatus};
use super::task_listing::DueWindow;
use super::user::UserId;

/// Reporting window ending now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DashboardPeriod {
    /// The last seven days.
    Week,
    /// Since the start of the current UTC month.
    #[default]
    Month,
    /// The last twelve months.
    Year,
}

impl DashboardPeriod {
    pub fn window(self, now: DateTime<Utc>) -> DueWindow {
        let start = match self {
            Self::Week => now - Duration::days(7),
            Self::Month => month_start(now),
            Self::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        };
        DueWindow { start, end: now }
    }
}

impl FromStr for DashboardPeriod {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "year" => Ok(Self::Year),
            _ => Err(UnknownPeriod),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownPeriod;

impl std::fmt::Display for UnknownPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "period must be week, month or year")
    }
}

impl std::error::Error for UnknownPeriod {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    pub delayed_tasks: usize,
    pub in_progress_tasks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBucket {
    /// Display label.
    pub name: String,
    pub priority: TaskPriority,
    pub value: usize,
}

/// Display label for a priority on the dashboard.
pub const fn priority_label(priority: TaskPriority) -> &'static str {
    match priority {
        TaskPriority::High => "عالية",
        TaskPriority::Medium => "متوسطة",
        TaskPriority::Low => "منخفضة",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePerformance {
    pub user_id: UserId,
    pub name: Option<String>,
    pub total: usize,
    pub completed: usize,
    /// Percentage in `0.0..=100.0`; zero when nothing is assigned.
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub stats: StatusCounts,
    pub priority_distribution: Vec<PriorityBucket>,
    pub employee_performance: Vec<EmployeePerformance>,
    pub trend: Vec<TrendPoint>,
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .and_then(|first| first.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(now)
}

pub fn completion_rate(completed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    completed as f64 / total as f64 * 100.0
}

pub fn status_counts(tasks: &[Task]) -> StatusCounts {
    tasks.iter().fold(
        StatusCounts {
            total_tasks: tasks.len(),
            ..StatusCounts::default()
        },
        |mut counts, task| {
            match task.status {
                TaskStatus::Completed => counts.completed_tasks += 1,
                TaskStatus::Pending => counts.pending_tasks += 1,
                TaskStatus::Delayed => counts.delayed_tasks += 1,
                TaskStatus::InProgress => counts.in_progress_tasks += 1,
            }
            counts
        },
    )
}

/// Counts per priority, listed high to low, including empty buckets.
pub fn priority_distribution(tasks: &[Task]) -> Vec<PriorityBucket> {
    TaskPriority::ALL
        .into_iter()
        .map(|priority| PriorityBucket {
            name: priority_label(priority).to_owned(),
            priority,
            value: tasks.iter().filter(|task| task.priority == priority).count(),
        })
        .collect()
}

/// Per-assignee totals in order of first appearance. Department-wide tasks
/// credit no individual.
pub fn employee_performance(
    tasks: &[Task],
    names: &HashMap<UserId, String>,
) -> Vec<EmployeePerformance> {
    let mut order: Vec<UserId> = Vec::new();
    let mut tallies: HashMap<UserId, (usize, usize)> = HashMap::new();
    for task in tasks {
        for user in task.assignment.assignees() {
            let tally = tallies.entry(*user).or_insert_with(|| {
                order.push(*user);
                (0, 0)
            });
            tally.0 += 1;
            if task.is_completed() {
                tally.1 += 1;
            }
        }
    }
    order
        .into_iter()
        .map(|user_id| {
            let (total, completed) = tallies.get(&user_id).copied().unwrap_or_default();
            EmployeePerformance {
                user_id,
                name: names.get(&user_id).cloned(),
                total,
                completed,
                completion_rate: completion_rate(completed, total),
            }
        })
        .collect()
}

/// Tasks grouped by UTC creation day, oldest first.
pub fn creation_trend(tasks: &[Task]) -> Vec<TrendPoint> {
    let mut by_day: BTreeMap<NaiveDate, (usize, usize)> = BTreeMap::new();
    for task in tasks {
        let bucket = by_day.entry(task.created_at.date_naive()).or_default();
        bucket.0 += 1;
        if task.is_completed() {
            bucket.1 += 1;
        }
    }
    by_day
        .into_iter()
        .map(|(date, (total, completed))| TrendPoint {
            date,
            total,
            completed,
        })
        .collect()
}

pub fn summarise(tasks: &[Task], names: &HashMap<UserId, String>) -> DashboardSummary {
    DashboardSummary {
        stats: status_counts(tasks),
        priority_distribution: priority_distribution(tasks),
        employee_performance: employee_performance(tasks, names),
        trend: creation_trend(tasks),
    }
}

#[cfg(test)]
#[path = "dashboard_tests.rs"]
mod tests;
