//! JSON request and response bodies of the task HTTP API.
//!
//! Request bodies keep `assignedTo` as a raw JSON value so that the
//! service can reject scalars and other malformed shapes with a precise
//! message instead of a generic deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{ChecklistItem, Priority, Task, TaskId, TaskStatus, UserId};
use crate::user::UserSummary;

/// Body of `POST /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Task title; must not be blank.
    #[serde(default)]
    pub title: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Priority, `Medium` when omitted.
    #[serde(default)]
    pub priority: Priority,
    /// Due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Expected to be a non-empty array of user ids.
    #[serde(default)]
    pub assigned_to: Option<serde_json::Value>,
    /// Attachment references.
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Initial checklist.
    #[serde(default)]
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Body of `PUT /tasks/{id}`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New due date.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// New assignees; validated like on creation.
    #[serde(default)]
    pub assigned_to: Option<serde_json::Value>,
    /// New attachment list.
    #[serde(default)]
    pub attachments: Option<Vec<String>>,
    /// New checklist; progress and status are re-derived from it.
    #[serde(default)]
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

/// Body of `PUT /tasks/{id}/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    /// Status to force; `None` keeps the current one.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Body of `PUT /tasks/{id}/checklist`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChecklistRequest {
    /// Replacement checklist.
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Query string of `GET /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskListQuery {
    /// Exact-match status filter.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Read-model of a task: assignees expanded and checklist completion counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    /// Task identifier.
    #[serde(rename = "_id")]
    pub id: TaskId,
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Status.
    pub status: TaskStatus,
    /// Due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Assignees known to the user directory.
    pub assigned_to: Vec<UserSummary>,
    /// Creator.
    pub created_by: UserId,
    /// Checklist.
    pub todo_checklist: Vec<ChecklistItem>,
    /// Number of completed checklist items.
    pub completed_count: usize,
    /// Progress percentage.
    pub progress: u8,
    /// Attachment references.
    pub attachments: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl TaskView {
    /// Builds the view of `task` with the given expanded assignees.
    #[must_use]
    pub fn new(task: Task, assigned_to: Vec<UserSummary>) -> Self {
        let completed_count = task.completed_count();
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            assigned_to,
            created_by: task.created_by,
            todo_checklist: task.todo_checklist,
            completed_count,
            progress: task.progress,
            attachments: task.attachments,
            created_at: task.created_at,
            updated_at: task.updated_at,
        }
    }
}

/// Per-status counts returned alongside a task listing.
///
/// `all` counts every visible task regardless of the status filter, while
/// the named buckets only count tasks that also pass the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    /// Visible tasks, status filter ignored.
    pub all: usize,
    /// Visible `Pending` tasks passing the filter.
    pub pending_tasks: usize,
    /// Visible `In Progress` tasks passing the filter.
    pub in_progress_tasks: usize,
    /// Visible `Completed` tasks passing the filter.
    pub completed_tasks: usize,
}

impl StatusSummary {
    /// Tallies the visible tasks under an optional status filter.
    pub fn tally<'a>(visible: impl IntoIterator<Item = &'a Task>, filter: Option<TaskStatus>) -> Self {
        visible.into_iter().fold(Self::default(), |mut summary, task| {
            summary.all += 1;
            if filter.is_none_or(|status| status == task.status) {
                match task.status {
                    TaskStatus::Pending => summary.pending_tasks += 1,
                    TaskStatus::InProgress => summary.in_progress_tasks += 1,
                    TaskStatus::Completed => summary.completed_tasks += 1,
                }
            }
            summary
        })
    }
}

/// Response of `GET /tasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListResponse {
    /// Visible tasks passing the filter.
    pub tasks: Vec<TaskView>,
    /// Status counts over the visible tasks.
    pub status_summary: StatusSummary,
}

/// A confirmation message carrying the affected task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMessage {
    /// Human-readable confirmation.
    pub message: String,
    /// The task after the operation.
    pub task: TaskView,
}

/// Response of `PUT /tasks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTaskMessage {
    /// Human-readable confirmation.
    pub message: String,
    /// The task after the update.
    pub updated_task: TaskView,
}

/// A bare message body, used for confirmations and client errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    /// Human-readable message.
    pub message: String,
    /// Underlying error text, only present on server errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MessageBody {
    /// A message without error detail.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: None,
        }
    }

    /// A message with the underlying error text attached.
    pub fn with_error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: Some(error.into()),
        }
    }
}
