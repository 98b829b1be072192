//! Dashboard aggregator: read-only summaries over the task store.
//!
//! Both dashboards share one code path and differ only by their
//! [`DashboardScope`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use taskdeck_proto::dashboard::DashboardData;
use taskdeck_proto::task::{Task, UserId};

use crate::store::TaskStore;

/// Which tasks a dashboard summarizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardScope {
    /// Every task.
    Global,
    /// Only tasks assigned to this user.
    AssignedTo(UserId),
}

impl DashboardScope {
    /// Returns `true` if `task` falls in this scope.
    #[must_use]
    pub fn includes(&self, task: &Task) -> bool {
        match self {
            Self::Global => true,
            Self::AssignedTo(user) => task.is_assigned(user),
        }
    }
}

/// Computes dashboards from the task store.
pub struct DashboardAggregator {
    store: Arc<TaskStore>,
}

impl DashboardAggregator {
    /// Creates an aggregator over the given store.
    #[must_use]
    pub const fn new(store: Arc<TaskStore>) -> Self {
        Self { store }
    }

    /// Summarizes the tasks in `scope`, judging overdue against `now`.
    pub async fn summarize(&self, scope: &DashboardScope, now: DateTime<Utc>) -> DashboardData {
        let tasks = self.store.find(|t| scope.includes(t)).await;
        let data = DashboardData::from_tasks(&tasks, now);
        tracing::debug!(
            scope = ?scope,
            total = data.statistics.total_tasks,
            overdue = data.statistics.overdue_tasks,
            "dashboard computed"
        );
        data
    }
}
