//! Async driver for a [`TaskEngine`].
//!
//! One tokio task owns the engine and is its only mutator. Commands arrive
//! over an mpsc channel and are applied one at a time, always ahead of a
//! pending tick, so a tick never observes a half-applied command.
//!
//! The periodic tick lives in a single `Option<Interval>` slot. It is armed
//! when a task starts running and dropped as soon as none is, which makes a
//! second concurrent registration impossible.
//!
//! After every command and every tick the current [`SessionSnapshot`] is
//! published on a watch channel; events go out on a broadcast channel.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::engine::TaskEngine;
use crate::error::{CoreError, RuntimeError};
use crate::events::Event;
use crate::snapshot::SessionSnapshot;
use crate::task::{TaskDraft, TaskId};

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(250);

const REQUEST_BUFFER: usize = 64;
const EVENT_BUFFER: usize = 256;

/// Lifecycle command forwarded to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Start(TaskId),
    TogglePause(TaskId),
    Complete(TaskId, Option<String>),
    GiveUp(TaskId),
    ToggleActive,
    CompleteActive(Option<String>),
    GiveUpActive,
    Reset,
}

enum Request {
    Create {
        draft: TaskDraft,
        reply: oneshot::Sender<Result<TaskId, CoreError>>,
    },
    Apply {
        op: Op,
        reply: oneshot::Sender<Option<Event>>,
    },
    Stats {
        reply: oneshot::Sender<TickerStats>,
    },
    Dispose {
        reply: oneshot::Sender<SessionSnapshot>,
    },
}

/// Tick bookkeeping, exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickerStats {
    pub armed: bool,
    /// How many times an interval has been registered.
    pub arms: u64,
    pub ticks: u64,
}

struct Ticker {
    period: Duration,
    interval: Option<Interval>,
    stats: TickerStats,
}

impl Ticker {
    fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
            stats: TickerStats::default(),
        }
    }

    fn sync(&mut self, wanted: bool) {
        match (wanted, self.interval.is_some()) {
            (true, false) => {
                let mut interval = interval_at(Instant::now() + self.period, self.period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.interval = Some(interval);
                self.stats.arms += 1;
                debug!(period_ms = self.period.as_millis() as u64, "tick armed");
            }
            (false, true) => {
                self.interval = None;
                debug!("tick disarmed");
            }
            _ => {}
        }
        self.stats.armed = self.interval.is_some();
    }

    async fn wait(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

/// Owns the engine inside the spawned task.
pub struct SessionRuntime<C> {
    engine: TaskEngine<C>,
    ticker: Ticker,
    snapshots: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<Event>,
}

impl<C> SessionRuntime<C>
where
    C: Clock + Send + 'static,
{
    /// Spawn the session loop on the current tokio runtime.
    pub fn spawn(engine: TaskEngine<C>, tick_interval: Duration) -> SessionHandle {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

        let runtime = SessionRuntime {
            engine,
            ticker: Ticker::new(tick_interval),
            snapshots: snapshot_tx,
            events: event_tx.clone(),
        };
        tokio::spawn(runtime.run(request_rx));

        SessionHandle {
            requests: request_tx,
            snapshots: snapshot_rx,
            events: event_tx,
        }
    }

    async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        info!(session_id = %self.engine.session_id(), "session runtime started");
        let mut dispose_reply = None;
        loop {
            tokio::select! {
                biased;
                request = requests.recv() => match request {
                    Some(request) => {
                        if let Some(reply) = self.handle(request) {
                            dispose_reply = Some(reply);
                            break;
                        }
                    }
                    None => break,
                },
                () = self.ticker.wait() => self.on_tick(),
            }
        }

        let Self {
            engine, snapshots, ..
        } = self;
        let final_snapshot = engine.dispose();
        snapshots.send_replace(final_snapshot.clone());
        if let Some(reply) = dispose_reply {
            let _ = reply.send(final_snapshot);
        }
        info!("session runtime stopped");
    }

    /// Returns the reply channel when the request asks to dispose.
    fn handle(&mut self, request: Request) -> Option<oneshot::Sender<SessionSnapshot>> {
        match request {
            Request::Create { draft, reply } => {
                let result = self.engine.create_task_with(draft);
                self.publish();
                if let Ok(id) = &result {
                    if let Some(task) = self.engine.task(id) {
                        self.emit(Event::created(task));
                    }
                }
                let _ = reply.send(result.map_err(CoreError::from));
            }
            Request::Apply { op, reply } => {
                let event = self.apply(op);
                self.publish();
                if let Some(event) = &event {
                    self.emit(event.clone());
                }
                let _ = reply.send(event);
            }
            Request::Stats { reply } => {
                let _ = reply.send(self.ticker.stats);
            }
            Request::Dispose { reply } => return Some(reply),
        }
        None
    }

    fn apply(&mut self, op: Op) -> Option<Event> {
        match op {
            Op::Start(id) => self.engine.start(&id),
            Op::TogglePause(id) => self.engine.toggle_pause(&id),
            Op::Complete(id, note) => self.engine.complete(&id, note),
            Op::GiveUp(id) => self.engine.give_up(&id),
            Op::ToggleActive => self.engine.toggle_active(),
            Op::CompleteActive(note) => self.engine.complete_active(note),
            Op::GiveUpActive => self.engine.give_up_active(),
            Op::Reset => self.engine.reset(),
        }
    }

    fn on_tick(&mut self) {
        self.ticker.stats.ticks += 1;
        let event = self.engine.tick();
        self.publish();
        if let Some(event) = event {
            self.emit(event);
        }
    }

    /// Re-arm or drop the tick, then publish the new state.
    /// Must run before replies and events go out.
    fn publish(&mut self) {
        self.ticker.sync(self.engine.wants_tick());
        self.snapshots.send_replace(self.engine.snapshot());
    }

    fn emit(&self, event: Event) {
        debug!(task_id = ?event.task_id(), "event emitted");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Cloneable front door to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    requests: mpsc::Sender<Request>,
    snapshots: watch::Receiver<SessionSnapshot>,
    events: broadcast::Sender<Event>,
}

impl SessionHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.requests
            .send(build(tx))
            .await
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    pub async fn create_task(&self, draft: TaskDraft) -> Result<TaskId, CoreError> {
        self.call(|reply| Request::Create { draft, reply }).await?
    }

    /// Apply a lifecycle command. `Ok(None)` means the command was a no-op.
    pub async fn apply(&self, op: Op) -> Result<Option<Event>, RuntimeError> {
        self.call(|reply| Request::Apply { op, reply }).await
    }

    pub async fn start(&self, id: &TaskId) -> Result<Option<Event>, RuntimeError> {
        self.apply(Op::Start(id.clone())).await
    }

    pub async fn toggle_pause(&self, id: &TaskId) -> Result<Option<Event>, RuntimeError> {
        self.apply(Op::TogglePause(id.clone())).await
    }

    pub async fn complete(
        &self,
        id: &TaskId,
        note: Option<String>,
    ) -> Result<Option<Event>, RuntimeError> {
        self.apply(Op::Complete(id.clone(), note)).await
    }

    pub async fn give_up(&self, id: &TaskId) -> Result<Option<Event>, RuntimeError> {
        self.apply(Op::GiveUp(id.clone())).await
    }

    pub async fn reset(&self) -> Result<Option<Event>, RuntimeError> {
        self.apply(Op::Reset).await
    }

    pub async fn ticker_stats(&self) -> Result<TickerStats, RuntimeError> {
        self.call(|reply| Request::Stats { reply }).await
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Stop the session loop and return the final state.
    pub async fn dispose(self) -> Result<SessionSnapshot, RuntimeError> {
        self.call(|reply| Request::Dispose { reply }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MonotonicClock;
    use crate::task::{FailureReason, TaskStatus};

    fn spawn() -> SessionHandle {
        SessionRuntime::spawn(TaskEngine::new(MonotonicClock::new()), DEFAULT_TICK_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_arms_only_while_running() {
        let session = spawn();
        let id = session.create_task(TaskDraft::new("a", 5)).await.unwrap();
        assert!(!session.ticker_stats().await.unwrap().armed);

        session.start(&id).await.unwrap();
        let stats = session.ticker_stats().await.unwrap();
        assert!(stats.armed);
        assert_eq!(stats.arms, 1);

        session.toggle_pause(&id).await.unwrap();
        assert!(!session.ticker_stats().await.unwrap().armed);

        session.toggle_pause(&id).await.unwrap();
        session.complete(&id, None).await.unwrap();
        let stats = session.ticker_stats().await.unwrap();
        assert!(!stats.armed);
        assert_eq!(stats.arms, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_commands_never_double_register() {
        let session = spawn();
        let a = session.create_task(TaskDraft::new("a", 5)).await.unwrap();
        let b = session.create_task(TaskDraft::new("b", 5)).await.unwrap();

        session.start(&a).await.unwrap();
        session.start(&a).await.unwrap();
        session.start(&b).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;

        let stats = session.ticker_stats().await.unwrap();
        assert_eq!(stats.arms, 1);
        assert!(stats.ticks >= 7);
        assert_eq!(session.snapshot().summary.counts.active, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expires_to_failed_and_stops_ticking() {
        let session = spawn();
        let mut events = session.subscribe();
        let id = session.create_task(TaskDraft::new("sprint", 1)).await.unwrap();
        session.start(&id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(61)).await;

        let snapshot = session.snapshot();
        let task = snapshot.task(&id).unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.remaining_ms, 0);
        assert!(snapshot.active.is_none());

        let stats = session.ticker_stats().await.unwrap();
        assert!(!stats.armed);
        let ticks = stats.ticks;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.ticker_stats().await.unwrap().ticks, ticks);

        let mut saw_expiry = false;
        while let Ok(event) = events.try_recv() {
            if let Event::TaskFailed { reason, .. } = event {
                assert_eq!(reason, FailureReason::Expired);
                saw_expiry = true;
            }
        }
        assert!(saw_expiry);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshots_track_the_countdown() {
        let session = spawn();
        let mut watch = session.watch();
        let id = session.create_task(TaskDraft::new("a", 25)).await.unwrap();
        session.start(&id).await.unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        let remaining = watch.borrow_and_update().task(&id).unwrap().remaining_ms;
        // The tick due at exactly 10s may not have run yet.
        assert!((1_490_000..=1_490_250).contains(&remaining));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_draft_is_a_validation_error() {
        let session = spawn();
        let err = session.create_task(TaskDraft::new(" ", 5)).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(session.snapshot().tasks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_returns_final_state_and_closes() {
        let session = spawn();
        let other = session.clone();
        session.create_task(TaskDraft::new("a", 5)).await.unwrap();

        let snapshot = session.dispose().await.unwrap();
        assert_eq!(snapshot.tasks.len(), 1);
        assert_eq!(
            other.reset().await.unwrap_err(),
            RuntimeError::Closed
        );
    }
}
