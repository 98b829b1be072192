//! Task records and the checklist → progress → status derivation rules.
//!
//! A [`Task`] is the single persisted document of the service. Its
//! `progress` is never written directly: it is always recomputed from the
//! `todo_checklist`, and the status follows from it unless it is forced
//! through [`Task::apply_status`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum value of [`Task::progress`].
pub const MAX_PROGRESS: u8 = 100;

/// Unique identifier for a task, based on UUID v7 for time-ordering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Error returned when a user identifier is blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("user id must not be empty")]
pub struct InvalidUserId;

/// Opaque reference to a user known to the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a user id, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidUserId`] if the trimmed id is empty.
    pub fn parse(raw: &str) -> Result<Self, InvalidUserId> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(InvalidUserId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// Should be picked up first.
    High,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    /// No checklist item done yet.
    #[default]
    Pending,
    /// Some, but not all, of the checklist is done.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Everything is done.
    Completed,
}

impl TaskStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    /// Derives the status implied by a progress percentage.
    #[must_use]
    pub const fn from_progress(progress: u8) -> Self {
        match progress {
            0 => Self::Pending,
            MAX_PROGRESS.. => Self::Completed,
            _ => Self::InProgress,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// One entry of a task's todo list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// What needs to be done.
    pub text: String,
    /// Whether it has been done.
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    /// Creates a checklist item.
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }
}

/// Computes `round(100 * completed / total)`, rounding halves up.
///
/// An empty checklist has no progress.
#[must_use]
pub fn progress_for(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let rounded = (completed * 200 + total) / (total * 2);
    u8::try_from(rounded).unwrap_or(MAX_PROGRESS)
}

/// A persisted task document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique task identifier, immutable.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Priority bucket.
    #[serde(default)]
    pub priority: Priority,
    /// Current status.
    #[serde(default)]
    pub status: TaskStatus,
    /// When the task is due, if ever.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Users working on the task. Never empty.
    pub assigned_to: Vec<UserId>,
    /// User who created the task, immutable.
    pub created_by: UserId,
    /// Ordered todo list.
    #[serde(default)]
    pub todo_checklist: Vec<ChecklistItem>,
    /// Percentage of the checklist that is done.
    #[serde(default)]
    pub progress: u8,
    /// Opaque attachment references (usually URLs).
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Creation time, immutable.
    pub created_at: DateTime<Utc>,
    /// Time of the last committed mutation.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Number of checklist items marked completed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    /// Returns `true` if `user` is one of the assignees.
    #[must_use]
    pub fn is_assigned(&self, user: &UserId) -> bool {
        self.assigned_to.iter().any(|id| id == user)
    }

    /// Returns `true` if the task is past due and not completed.
    ///
    /// A task without a due date is never overdue.
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status != TaskStatus::Completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Recomputes `progress` from the checklist.
    pub fn recompute_progress(&mut self) {
        self.progress = progress_for(self.completed_count(), self.todo_checklist.len());
    }

    /// Replaces the checklist wholesale, then recomputes progress and the
    /// status it implies.
    pub fn replace_checklist(&mut self, items: Vec<ChecklistItem>) {
        self.todo_checklist = items;
        self.recompute_progress();
        self.status = TaskStatus::from_progress(self.progress);
    }

    /// Forces a status, leaving it unchanged when `status` is `None`.
    ///
    /// A completed task has every checklist item completed and full
    /// progress, whatever the checklist said before. Any other status keeps
    /// progress derived from the checklist; a fully ticked checklist is
    /// reopened (every item unticked) so that only `Completed` reaches 100.
    pub fn apply_status(&mut self, status: Option<TaskStatus>) {
        if let Some(status) = status {
            self.status = status;
        }
        if self.status == TaskStatus::Completed {
            for item in &mut self.todo_checklist {
                item.completed = true;
            }
            self.progress = MAX_PROGRESS;
            return;
        }

        self.recompute_progress();
        if self.progress == MAX_PROGRESS {
            for item in &mut self.todo_checklist {
                item.completed = false;
            }
            self.recompute_progress();
        }
    }
}
