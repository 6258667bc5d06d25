//! # Finish-It Core Library
//!
//! This library provides the business logic behind the Finish-It focus timer.
//! All state lives in memory: a session is created, driven by user commands
//! and a periodic tick, and discarded when the process exits.
//!
//! ## Architecture
//!
//! - **Task Engine**: a wall-clock-delta state machine owning the task list.
//!   Exactly one task counts down at a time; the caller drives `tick()`.
//! - **Runtime**: a single tokio task that owns the engine, applies commands
//!   in order and arms the tick interval only while a countdown is running.
//! - **Scoring**: a pure reduction from tasks to mastery points and rank.
//! - **Config**: TOML-based defaults for new tasks, tick rate and logging.
//!
//! ## Key Components
//!
//! - [`TaskEngine`]: task lifecycle state machine
//! - [`SessionRuntime`] / [`SessionHandle`]: async single-mutator driver
//! - [`MasteryReport`]: derived points and rank
//! - [`Config`]: application configuration management

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod runtime;
pub mod scoring;
pub mod snapshot;
pub mod task;
pub mod technique;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::Config;
pub use engine::TaskEngine;
pub use error::{ConfigError, CoreError, RuntimeError, ValidationError};
pub use events::Event;
pub use runtime::{SessionHandle, SessionRuntime};
pub use scoring::{MasteryReport, MasteryStats, Rank, RankProgress};
pub use snapshot::{SessionSnapshot, SessionSummary, StatusCounts};
pub use task::{parse_minutes, FailureReason, Task, TaskDraft, TaskId, TaskStatus};
pub use technique::{BreathingCadence, BreathingTechnique};
