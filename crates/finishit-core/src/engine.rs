//! Task lifecycle engine.
//!
//! The engine is a wall-clock-delta state machine over a list of tasks. It
//! does not use internal threads - the caller is responsible for calling
//! `tick()` periodically while [`TaskEngine::wants_tick`] is true.
//!
//! ## State Transitions
//!
//! ```text
//! Pending -> Active(running) <-> Active(paused)
//! Pending -> Done      (complete)
//! Active  -> Done      (complete)
//! Active  -> Failed    (give up, or countdown reaches 0)
//! ```
//!
//! `Done` and `Failed` are terminal. Commands on a task in the wrong state
//! return `None` and change nothing.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TaskEngine::new(MonotonicClock::new());
//! let id = engine.create_task("Write report", 25)?;
//! engine.start(&id);
//! // In a loop:
//! engine.tick(); // Returns Some(Event::TaskFailed) when time runs out
//! ```

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::{Clock, MonotonicClock};
use crate::error::ValidationError;
use crate::events::Event;
use crate::snapshot::{SessionSnapshot, SessionSummary};
use crate::task::{FailureReason, Task, TaskDraft, TaskId, TaskStatus};

/// Owns every task of one session.
#[derive(Debug)]
pub struct TaskEngine<C = MonotonicClock> {
    clock: C,
    session_id: Uuid,
    /// Bumped on reset so ids from earlier sessions are never reissued.
    generation: u32,
    next_seq: u64,
    tasks: Vec<Task>,
    active: Option<TaskId>,
    /// Clock reading at the previous tick. Set only while a task is running.
    last_tick_ms: Option<u64>,
}

impl<C: Clock> TaskEngine<C> {
    pub fn new(clock: C) -> Self {
        let session_id = Uuid::new_v4();
        info!(%session_id, "session created");
        Self {
            clock,
            session_id,
            generation: 0,
            next_seq: 0,
            tasks: Vec::new(),
            active: None,
            last_tick_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn active_id(&self) -> Option<&TaskId> {
        self.active.as_ref()
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active.as_ref().and_then(|id| self.task(id))
    }

    /// True while the active task is counting down.
    pub fn wants_tick(&self) -> bool {
        self.active_task().is_some_and(Task::is_running)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary::from_tasks(&self.tasks)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            tasks: self.tasks.clone(),
            active: self.active.clone(),
            summary: self.summary(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn create_task(&mut self, title: &str, minutes: u32) -> Result<TaskId, ValidationError> {
        self.create_task_with(TaskDraft::new(title, minutes))
    }

    pub fn create_task_with(&mut self, draft: TaskDraft) -> Result<TaskId, ValidationError> {
        self.insert(draft).map(|task| task.id.clone())
    }

    pub fn start(&mut self, id: &TaskId) -> Option<Event> {
        if let Some(current) = &self.active {
            if current != id {
                warn!(task_id = %id, active = %current, "start ignored: another task is active");
            }
            return None;
        }
        let now = self.clock.now_ms();
        let task = self.pending_mut(id)?;
        task.status = TaskStatus::Active;
        task.paused = false;
        task.started_at = Some(Utc::now());
        let remaining_ms = task.remaining_ms;
        self.active = Some(id.clone());
        self.last_tick_ms = Some(now);
        debug!(task_id = %id, remaining_ms, "task started");
        Some(Event::TaskStarted {
            task_id: id.clone(),
            remaining_ms,
            at: Utc::now(),
        })
    }

    /// Pause a running task, or resume a paused one.
    pub fn toggle_pause(&mut self, id: &TaskId) -> Option<Event> {
        let running = self.active_mut(id)?.is_running();
        if running {
            // Flush elapsed time first.
            self.flush_elapsed();
            if !self.is_active(id) {
                return self.expired_event(id);
            }
            self.last_tick_ms = None;
            let task = self.active_mut(id)?;
            task.paused = true;
            debug!(task_id = %id, remaining_ms = task.remaining_ms, "task paused");
            Some(Event::TaskPaused {
                task_id: id.clone(),
                remaining_ms: task.remaining_ms,
                at: Utc::now(),
            })
        } else {
            let now = self.clock.now_ms();
            let task = self.active_mut(id)?;
            task.paused = false;
            let remaining_ms = task.remaining_ms;
            self.last_tick_ms = Some(now);
            debug!(task_id = %id, remaining_ms, "task resumed");
            Some(Event::TaskResumed {
                task_id: id.clone(),
                remaining_ms,
                at: Utc::now(),
            })
        }
    }

    /// Mark a pending or active task done.
    pub fn complete(&mut self, id: &TaskId, note: Option<String>) -> Option<Event> {
        if self.is_active(id) {
            self.flush_elapsed();
            if !self.is_active(id) {
                return self.expired_event(id);
            }
        }
        let task = self.tasks.iter_mut().find(|t| &t.id == id)?;
        if task.status.is_terminal() {
            return None;
        }
        let victory_note = note.filter(|n| !n.trim().is_empty());
        task.status = TaskStatus::Done;
        task.paused = true;
        task.victory_note = victory_note.clone();
        task.finished_at = Some(Utc::now());
        let remaining_ms = task.remaining_ms;
        self.release(id);
        debug!(task_id = %id, remaining_ms, "task completed");
        Some(Event::TaskCompleted {
            task_id: id.clone(),
            remaining_ms,
            victory_note,
            at: Utc::now(),
        })
    }

    pub fn give_up(&mut self, id: &TaskId) -> Option<Event> {
        self.active_mut(id)?;
        self.flush_elapsed();
        if !self.is_active(id) {
            return self.expired_event(id);
        }
        let task = self.active_mut(id)?;
        fail(task, FailureReason::GaveUp);
        debug!(task_id = %id, remaining_ms = task.remaining_ms, "task given up");
        self.release(id);
        self.failed_event(id)
    }

    pub fn toggle_active(&mut self) -> Option<Event> {
        let id = self.active.clone()?;
        self.toggle_pause(&id)
    }

    pub fn complete_active(&mut self, note: Option<String>) -> Option<Event> {
        let id = self.active.clone()?;
        self.complete(&id, note)
    }

    pub fn give_up_active(&mut self) -> Option<Event> {
        let id = self.active.clone()?;
        self.give_up(&id)
    }

    /// Call periodically. Returns `Some(Event::TaskFailed)` when the active
    /// task runs out of time.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.wants_tick() {
            return None;
        }
        let id = self.active.clone()?;
        self.flush_elapsed();
        self.expired_event(&id)
    }

    /// Clear every task and restart id generation.
    pub fn reset(&mut self) -> Option<Event> {
        let cleared = self.tasks.len();
        self.tasks.clear();
        self.active = None;
        self.last_tick_ms = None;
        self.generation = self.generation.wrapping_add(1);
        self.next_seq = 0;
        info!(session_id = %self.session_id, cleared, generation = self.generation, "session reset");
        Some(Event::SessionReset {
            cleared,
            at: Utc::now(),
        })
    }

    /// End the session, returning its final state.
    pub fn dispose(mut self) -> SessionSnapshot {
        if self.wants_tick() {
            self.flush_elapsed();
        }
        info!(session_id = %self.session_id, tasks = self.tasks.len(), "session disposed");
        self.snapshot()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn insert(&mut self, draft: TaskDraft) -> Result<&Task, ValidationError> {
        if let Err(e) = draft.validate() {
            warn!(error = %e, "task rejected");
            return Err(e);
        }
        let id = TaskId::issue(self.generation, self.next_seq);
        self.next_seq += 1;
        let task = Task::from_draft(id, draft);
        debug!(task_id = %task.id, title = %task.title, duration_ms = task.initial_duration_ms, "task created");
        self.tasks.push(task);
        Ok(&self.tasks[self.tasks.len() - 1])
    }

    fn is_active(&self, id: &TaskId) -> bool {
        self.active.as_ref() == Some(id)
    }

    fn pending_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id && t.status == TaskStatus::Pending)
    }

    fn active_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        if !self.is_active(id) {
            return None;
        }
        self.tasks
            .iter_mut()
            .find(|t| &t.id == id && t.status == TaskStatus::Active)
    }

    fn release(&mut self, id: &TaskId) {
        if self.is_active(id) {
            self.active = None;
            self.last_tick_ms = None;
        }
    }

    /// Subtract the time since the previous reading from the running task.
    /// Fails the task if its countdown reaches zero.
    fn flush_elapsed(&mut self) {
        let Some(last) = self.last_tick_ms else {
            return;
        };
        let now = self.clock.now_ms();
        let elapsed = now.saturating_sub(last);
        self.last_tick_ms = Some(now);

        let Some(id) = self.active.clone() else {
            return;
        };
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            return;
        };
        if !task.is_running() {
            return;
        }
        task.remaining_ms = task.remaining_ms.saturating_sub(elapsed);
        if task.remaining_ms == 0 {
            fail(task, FailureReason::Expired);
            info!(task_id = %id, "task expired");
            self.release(&id);
        }
    }

    fn expired_event(&self, id: &TaskId) -> Option<Event> {
        let task = self.task(id)?;
        if task.failure == Some(FailureReason::Expired) && !self.is_active(id) {
            self.failed_event(id)
        } else {
            None
        }
    }

    fn failed_event(&self, id: &TaskId) -> Option<Event> {
        let task = self.task(id)?;
        Some(Event::TaskFailed {
            task_id: id.clone(),
            reason: task.failure?,
            remaining_ms: task.remaining_ms,
            at: Utc::now(),
        })
    }
}

impl Default for TaskEngine<MonotonicClock> {
    fn default() -> Self {
        Self::new(MonotonicClock::new())
    }
}

fn fail(task: &mut Task, reason: FailureReason) {
    task.status = TaskStatus::Failed;
    task.paused = true;
    task.failure = Some(reason);
    task.finished_at = Some(Utc::now());
}
