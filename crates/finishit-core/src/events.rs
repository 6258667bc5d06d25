use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{FailureReason, Task, TaskId};

/// Every state change in a session produces an Event.
/// The display layer subscribes to them; snapshots carry the full state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TaskCreated {
        task_id: TaskId,
        title: String,
        duration_ms: u64,
        at: DateTime<Utc>,
    },
    TaskStarted {
        task_id: TaskId,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TaskPaused {
        task_id: TaskId,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TaskResumed {
        task_id: TaskId,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    TaskCompleted {
        task_id: TaskId,
        remaining_ms: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        victory_note: Option<String>,
        at: DateTime<Utc>,
    },
    TaskFailed {
        task_id: TaskId,
        reason: FailureReason,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    /// All tasks cleared and id generation restarted.
    SessionReset {
        cleared: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn created(task: &Task) -> Self {
        Event::TaskCreated {
            task_id: task.id.clone(),
            title: task.title.clone(),
            duration_ms: task.initial_duration_ms,
            at: task.created_at,
        }
    }

    /// The task this event concerns, if any.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Event::TaskCreated { task_id, .. }
            | Event::TaskStarted { task_id, .. }
            | Event::TaskPaused { task_id, .. }
            | Event::TaskResumed { task_id, .. }
            | Event::TaskCompleted { task_id, .. }
            | Event::TaskFailed { task_id, .. } => Some(task_id),
            Event::SessionReset { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::TaskFailed {
            task_id: TaskId::from("task-0-0"),
            reason: FailureReason::Expired,
            remaining_ms: 0,
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TaskFailed");
        assert_eq!(json["reason"], "expired");
        assert_eq!(json["task_id"], "task-0-0");
    }

    #[test]
    fn session_reset_has_no_task() {
        let event = Event::SessionReset {
            cleared: 3,
            at: Utc::now(),
        };
        assert!(event.task_id().is_none());
    }
}
