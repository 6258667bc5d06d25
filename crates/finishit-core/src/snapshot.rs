//! Read-only views handed to the display layer.

use serde::Serialize;
use uuid::Uuid;

use crate::scoring::MasteryReport;
use crate::task::{Task, TaskId, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub active: usize,
    pub done: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub counts: StatusCounts,
    /// Sum of every task's committed duration.
    pub committed_minutes: u64,
    /// Done share of all tasks, drives the session progress bar.
    pub done_pct: f64,
    pub mastery: MasteryReport,
}

impl SessionSummary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut counts = StatusCounts::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Active => counts.active += 1,
                TaskStatus::Done => counts.done += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        let done_pct = if tasks.is_empty() {
            0.0
        } else {
            counts.done as f64 / tasks.len() as f64 * 100.0
        };
        Self {
            counts,
            committed_minutes: tasks.iter().map(Task::initial_minutes).sum(),
            done_pct,
            mastery: MasteryReport::from_tasks(tasks),
        }
    }
}

/// Immutable copy of the whole session, in task insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub tasks: Vec<Task>,
    pub active: Option<TaskId>,
    pub summary: SessionSummary,
}

impl SessionSnapshot {
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref().and_then(|id| self.task(id))
    }
}
