//! Task data model.
//!
//! A [`Task`] is a timed commitment: a title, a countdown fixed at creation
//! and a status. Tasks are only mutated through [`crate::TaskEngine`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::technique::BreathingTechnique;

pub const MS_PER_MINUTE: u64 = 60 * 1000;

/// Opaque task identifier, unique within one engine.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub(crate) fn issue(generation: u32, seq: u64) -> Self {
        Self(format!("task-{generation}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Active,
    Done,
    Failed,
}

impl TaskStatus {
    /// `Done` and `Failed` accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Active => "active",
            TaskStatus::Done => "done",
            TaskStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Why a task ended up `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    GaveUp,
    Expired,
}

/// User input for a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub minutes: u32,
    pub technique: Option<BreathingTechnique>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, minutes: u32) -> Self {
        Self {
            title: title.into(),
            minutes,
            technique: None,
        }
    }

    pub fn with_technique(mut self, technique: BreathingTechnique) -> Self {
        self.technique = Some(technique);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.minutes == 0 {
            return Err(ValidationError::NonPositiveDuration);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub initial_duration_ms: u64,
    pub remaining_ms: u64,
    pub status: TaskStatus,
    /// Only meaningful while `status == Active`.
    pub paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub victory_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<BreathingTechnique>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    pub(crate) fn from_draft(id: TaskId, draft: TaskDraft) -> Self {
        let duration_ms = u64::from(draft.minutes) * MS_PER_MINUTE;
        Self {
            id,
            title: draft.title.trim().to_string(),
            initial_duration_ms: duration_ms,
            remaining_ms: duration_ms,
            status: TaskStatus::Pending,
            paused: true,
            victory_note: None,
            failure: None,
            technique: draft.technique,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn initial_minutes(&self) -> u64 {
        self.initial_duration_ms / MS_PER_MINUTE
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.initial_duration_ms - self.remaining_ms
    }

    /// Fraction of the countdown consumed, 0.0 ..= 1.0.
    pub fn progress(&self) -> f64 {
        if self.initial_duration_ms == 0 {
            return 0.0;
        }
        self.elapsed_ms() as f64 / self.initial_duration_ms as f64
    }

    /// True while the countdown is being decremented.
    pub fn is_running(&self) -> bool {
        self.status == TaskStatus::Active && !self.paused
    }
}

/// Parse the minutes field of the creation form.
pub fn parse_minutes(input: &str) -> Result<u32, ValidationError> {
    let trimmed = input.trim();
    match trimmed.parse::<i64>() {
        Ok(n) if n <= 0 => Err(ValidationError::NonPositiveDuration),
        Ok(n) => u32::try_from(n).map_err(|_| ValidationError::InvalidMinutes(trimmed.to_string())),
        Err(_) => Err(ValidationError::InvalidMinutes(trimmed.to_string())),
    }
}
