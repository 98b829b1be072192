//! Task service: validation, authorization and derived fields for every
//! task operation.
//!
//! All authorization goes through [`can_mutate`]; progress and status are
//! derived by the task model itself. Reads return [`TaskView`]s with the
//! assignees expanded through the [`UserDirectory`].

use std::sync::Arc;

use chrono::Utc;
use taskdeck_proto::api::{
    CreateTaskRequest, StatusSummary, TaskListResponse, TaskView, UpdateTaskRequest,
};
use taskdeck_proto::task::{ChecklistItem, Task, TaskId, TaskStatus, UserId};

use crate::policy::{TaskAction, can_mutate, in_scope};
use crate::store::{StoreError, TaskStore};
use crate::users::{Requester, UserDirectory};

/// Message used whenever `assignedTo` has the wrong shape.
pub const ASSIGNED_TO_NOT_ARRAY: &str = "assignedTo must be an array of user IDs";

/// Errors returned by task operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The request carried malformed input.
    #[error("{0}")]
    InvalidInput(String),

    /// No task has the requested id.
    #[error("Task not found")]
    NotFound,

    /// The requester may not perform this action on the task.
    #[error("Not authorized")]
    Forbidden,

    /// The store failed unexpectedly.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for TaskError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Task operations over a shared store and user directory.
pub struct TaskService {
    store: Arc<TaskStore>,
    users: Arc<UserDirectory>,
}

impl TaskService {
    /// Creates a service over the given store and directory.
    #[must_use]
    pub const fn new(store: Arc<TaskStore>, users: Arc<UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Lists the tasks in the requester's scope, optionally filtered by
    /// status, together with a status summary of that scope.
    pub async fn list(&self, filter: Option<TaskStatus>, requester: &Requester) -> TaskListResponse {
        tracing::debug!(requester = %requester.id, status = ?filter, "listing tasks");
        let visible = self.store.find(|t| in_scope(t, requester)).await;
        let status_summary = StatusSummary::tally(&visible, filter);

        let tasks = visible
            .into_iter()
            .filter(|t| filter.is_none_or(|status| t.status == status))
            .map(|t| self.view(t))
            .collect();

        TaskListResponse {
            tasks,
            status_summary,
        }
    }

    /// Fetches one task.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if absent, [`TaskError::Forbidden`] if the
    /// requester may not view it.
    pub async fn get(&self, id: &TaskId, requester: &Requester) -> Result<TaskView, TaskError> {
        tracing::debug!(task_id = %id, requester = %requester.id, "fetching task");
        let task = self.store.get(id).await.ok_or(TaskError::NotFound)?;
        authorize(&task, requester, TaskAction::View)?;
        Ok(self.view(task))
    }

    /// Creates a task owned by the requester.
    ///
    /// The new task starts `Pending` unless its initial checklist already
    /// implies progress.
    ///
    /// # Errors
    ///
    /// [`TaskError::InvalidInput`] for a blank title or a malformed
    /// `assignedTo`; [`TaskError::Store`] if persisting fails.
    pub async fn create(
        &self,
        req: CreateTaskRequest,
        requester: &Requester,
    ) -> Result<TaskView, TaskError> {
        tracing::debug!(requester = %requester.id, "creating task");
        let title = validate_title(&req.title)?;
        let assigned_to = self.parse_assignees(req.assigned_to.as_ref())?;

        let now = Utc::now();
        let mut task = Task {
            id: TaskId::new(),
            title,
            description: req.description,
            priority: req.priority,
            status: TaskStatus::Pending,
            due_date: req.due_date,
            assigned_to,
            created_by: requester.id.clone(),
            todo_checklist: Vec::new(),
            progress: 0,
            attachments: req.attachments,
            created_at: now,
            updated_at: now,
        };
        task.replace_checklist(req.todo_checklist);

        let task = self.store.insert(task).await?;
        tracing::info!(task_id = %task.id, requester = %requester.id, "task created");
        Ok(self.view(task))
    }

    /// Overwrites the supplied fields of a task.
    ///
    /// A supplied checklist re-derives progress and status.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`], then [`TaskError::Forbidden`] for
    /// non-admins, then [`TaskError::InvalidInput`] for a blank title or a
    /// malformed `assignedTo`.
    pub async fn update(
        &self,
        id: &TaskId,
        req: UpdateTaskRequest,
        requester: &Requester,
    ) -> Result<TaskView, TaskError> {
        tracing::debug!(task_id = %id, requester = %requester.id, "updating task");
        let task = self
            .store
            .update(id, |task| -> Result<(), TaskError> {
                authorize(task, requester, TaskAction::Update)?;
                let assigned_to = req
                    .assigned_to
                    .as_ref()
                    .map(|raw| self.parse_assignees(Some(raw)))
                    .transpose()?;
                let title = req.title.as_deref().map(validate_title).transpose()?;

                if let Some(title) = title {
                    task.title = title;
                }
                if let Some(description) = req.description {
                    task.description = description;
                }
                if let Some(priority) = req.priority {
                    task.priority = priority;
                }
                if let Some(due_date) = req.due_date {
                    task.due_date = Some(due_date);
                }
                if let Some(assigned_to) = assigned_to {
                    task.assigned_to = assigned_to;
                }
                if let Some(attachments) = req.attachments {
                    task.attachments = attachments;
                }
                if let Some(checklist) = req.todo_checklist {
                    task.replace_checklist(checklist);
                }
                task.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        tracing::info!(task_id = %task.id, requester = %requester.id, "task updated");
        Ok(self.view(task))
    }

    /// Permanently deletes a task.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if absent, [`TaskError::Forbidden`] for
    /// non-admins.
    pub async fn delete(&self, id: &TaskId, requester: &Requester) -> Result<(), TaskError> {
        tracing::debug!(task_id = %id, requester = %requester.id, "deleting task");
        let removed = self
            .store
            .remove(id, |task| authorize(task, requester, TaskAction::Delete))
            .await?;
        tracing::info!(task_id = %removed.id, requester = %requester.id, "task deleted");
        Ok(())
    }

    /// Forces the status of a task. Completing a task completes its whole
    /// checklist; any other status re-derives progress from the checklist.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if absent, [`TaskError::Forbidden`] unless
    /// the requester is an admin or an assignee.
    pub async fn update_status(
        &self,
        id: &TaskId,
        status: Option<TaskStatus>,
        requester: &Requester,
    ) -> Result<TaskView, TaskError> {
        tracing::debug!(task_id = %id, requester = %requester.id, status = ?status, "updating task status");
        let task = self
            .store
            .update(id, |task| -> Result<(), TaskError> {
                authorize(task, requester, TaskAction::UpdateStatus)?;
                task.apply_status(status);
                task.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            requester = %requester.id,
            status = %task.status,
            "task status updated"
        );
        Ok(self.view(task))
    }

    /// Replaces the checklist of a task and re-derives progress and status.
    ///
    /// # Errors
    ///
    /// [`TaskError::NotFound`] if absent, [`TaskError::Forbidden`] unless
    /// the requester is an admin or an assignee.
    pub async fn update_checklist(
        &self,
        id: &TaskId,
        checklist: Vec<ChecklistItem>,
        requester: &Requester,
    ) -> Result<TaskView, TaskError> {
        tracing::debug!(
            task_id = %id,
            requester = %requester.id,
            items = checklist.len(),
            "updating task checklist"
        );
        let task = self
            .store
            .update(id, |task| -> Result<(), TaskError> {
                authorize(task, requester, TaskAction::UpdateChecklist)?;
                task.replace_checklist(checklist);
                task.updated_at = Utc::now();
                Ok(())
            })
            .await?;

        tracing::info!(
            task_id = %task.id,
            requester = %requester.id,
            progress = task.progress,
            status = %task.status,
            "task checklist updated"
        );
        Ok(self.view(task))
    }

    /// Validates a raw `assignedTo` value into a de-duplicated list of known
    /// user ids.
    fn parse_assignees(&self, raw: Option<&serde_json::Value>) -> Result<Vec<UserId>, TaskError> {
        let Some(items) = raw.and_then(serde_json::Value::as_array) else {
            return Err(TaskError::InvalidInput(ASSIGNED_TO_NOT_ARRAY.to_string()));
        };
        if items.is_empty() {
            return Err(TaskError::InvalidInput(
                "assignedTo must contain at least one user ID".to_string(),
            ));
        }

        let mut ids: Vec<UserId> = Vec::with_capacity(items.len());
        for item in items {
            let id = item
                .as_str()
                .and_then(|s| UserId::parse(s).ok())
                .ok_or_else(|| TaskError::InvalidInput(ASSIGNED_TO_NOT_ARRAY.to_string()))?;
            if !self.users.contains(&id) {
                return Err(TaskError::InvalidInput(format!(
                    "unknown user ID in assignedTo: {id}"
                )));
            }
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn view(&self, task: Task) -> TaskView {
        let assignees = self.users.summaries(&task.assigned_to);
        TaskView::new(task, assignees)
    }
}

fn authorize(task: &Task, requester: &Requester, action: TaskAction) -> Result<(), TaskError> {
    if can_mutate(task, requester, action) {
        return Ok(());
    }
    tracing::warn!(
        task_id = %task.id,
        requester = %requester.id,
        action = %action,
        "task action refused"
    );
    Err(TaskError::Forbidden)
}

fn validate_title(raw: &str) -> Result<String, TaskError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(TaskError::InvalidInput("title is required".to_string()));
    }
    Ok(title.to_string())
}
