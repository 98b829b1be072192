//! Authorization policy for task reads and mutations.
//!
//! Admins may do anything. Assignees may read a task and progress it
//! (status and checklist), creators may read it, everyone else is refused.

use taskdeck_proto::task::Task;

use crate::users::Requester;

/// What a requester is trying to do with a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Read the task by id.
    View,
    /// Overwrite descriptive fields, assignees or checklist.
    Update,
    /// Remove the task permanently.
    Delete,
    /// Force the task status.
    UpdateStatus,
    /// Replace the task checklist.
    UpdateChecklist,
}

impl std::fmt::Display for TaskAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View => write!(f, "view"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::UpdateStatus => write!(f, "update_status"),
            Self::UpdateChecklist => write!(f, "update_checklist"),
        }
    }
}

/// Returns `true` if the task belongs to the requester's scope: every task
/// for admins, only assigned tasks otherwise.
#[must_use]
pub fn in_scope(task: &Task, requester: &Requester) -> bool {
    requester.is_admin() || task.is_assigned(&requester.id)
}

/// Decides whether `requester` may perform `action` on `task`.
#[must_use]
pub fn can_mutate(task: &Task, requester: &Requester, action: TaskAction) -> bool {
    if requester.is_admin() {
        return true;
    }
    match action {
        TaskAction::View => task.is_assigned(&requester.id) || task.created_by == requester.id,
        TaskAction::UpdateStatus | TaskAction::UpdateChecklist => task.is_assigned(&requester.id),
        TaskAction::Update | TaskAction::Delete => false,
    }
}
