//! Dashboard read-models and the single-pass tally that produces them.
//!
//! [`DashboardTally`] folds over a scoped set of tasks once, counting status
//! buckets, priority buckets and overdue tasks at the same time. Every
//! bucket is a plain field, so a bucket without matching tasks is reported
//! as zero rather than omitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Priority, Task, TaskId, TaskStatus};

/// Number of tasks listed under `recentTasks`.
pub const RECENT_TASK_LIMIT: usize = 10;

/// Headline counts of a dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    /// Tasks in scope.
    pub total_tasks: usize,
    /// Tasks in scope with status `Pending`.
    pub pending_tasks: usize,
    /// Tasks in scope with status `Completed`.
    pub completed_tasks: usize,
    /// Tasks in scope that are past due and not completed.
    pub overdue_tasks: usize,
}

/// Status distribution, keyed by status name without whitespace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TaskDistribution {
    /// `Pending` tasks.
    pub pending: usize,
    /// `In Progress` tasks.
    pub in_progress: usize,
    /// `Completed` tasks.
    pub completed: usize,
    /// All tasks in scope.
    pub all: usize,
}

/// Priority distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriorityLevels {
    /// `Low` priority tasks.
    pub low: usize,
    /// `Medium` priority tasks.
    pub medium: usize,
    /// `High` priority tasks.
    pub high: usize,
}

/// Chart data of a dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    /// Tasks per status.
    pub task_distribution: TaskDistribution,
    /// Tasks per priority.
    pub task_priority_levels: PriorityLevels,
}

/// A task reduced to what the recent-tasks list shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    /// Task identifier.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Status.
    pub status: TaskStatus,
    /// Priority.
    pub priority: Priority,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&Task> for RecentTask {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            title: task.title.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date,
            created_at: task.created_at,
        }
    }
}

/// Response of `GET /dashboard` and `GET /dashboard/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Headline counts.
    pub statistics: Statistics,
    /// Distributions.
    pub charts: Charts,
    /// Newest tasks first.
    pub recent_tasks: Vec<RecentTask>,
}

/// Running counts accumulated over the tasks in scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardTally {
    total: usize,
    pending: usize,
    in_progress: usize,
    completed: usize,
    low: usize,
    medium: usize,
    high: usize,
    overdue: usize,
}

impl DashboardTally {
    /// Counts one task.
    pub fn record(&mut self, task: &Task, overdue: bool) {
        self.total += 1;
        match task.status {
            TaskStatus::Pending => self.pending += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::Completed => self.completed += 1,
        }
        match task.priority {
            Priority::Low => self.low += 1,
            Priority::Medium => self.medium += 1,
            Priority::High => self.high += 1,
        }
        if overdue {
            self.overdue += 1;
        }
    }

    /// Folds every task into a fresh tally, judging overdue against `now`.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: DateTime<Utc>) -> Self {
        tasks.into_iter().fold(Self::default(), |mut tally, task| {
            tally.record(task, task.is_overdue(now));
            tally
        })
    }

    /// Headline counts.
    #[must_use]
    pub const fn statistics(&self) -> Statistics {
        Statistics {
            total_tasks: self.total,
            pending_tasks: self.pending,
            completed_tasks: self.completed,
            overdue_tasks: self.overdue,
        }
    }

    /// Status and priority distributions.
    #[must_use]
    pub const fn charts(&self) -> Charts {
        Charts {
            task_distribution: TaskDistribution {
                pending: self.pending,
                in_progress: self.in_progress,
                completed: self.completed,
                all: self.total,
            },
            task_priority_levels: PriorityLevels {
                low: self.low,
                medium: self.medium,
                high: self.high,
            },
        }
    }
}

/// The `limit` most recently created tasks, newest first.
///
/// Ties on creation time are broken by the (time-ordered) id, newest first.
#[must_use]
pub fn recent_tasks(tasks: &[Task], limit: usize) -> Vec<RecentTask> {
    let mut newest: Vec<&Task> = tasks.iter().collect();
    newest.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    newest.into_iter().take(limit).map(RecentTask::from).collect()
}

impl DashboardData {
    /// Builds a dashboard over the tasks in scope.
    #[must_use]
    pub fn from_tasks(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let tally = DashboardTally::from_tasks(tasks, now);
        Self {
            statistics: tally.statistics(),
            charts: tally.charts(),
            recent_tasks: recent_tasks(tasks, RECENT_TASK_LIMIT),
        }
    }
}
