//! Core error types for finishit-core.
//!
//! Nothing in the task lifecycle is fatal: rejected input is reported as a
//! [`ValidationError`] value and operations on tasks in the wrong state are
//! silent no-ops. The remaining variants cover configuration files and the
//! async runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for finishit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Session runtime errors
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Could not determine or create the config directory
    #[error("Config directory unavailable: {0}")]
    NoDirectory(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the config tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),
}

/// Rejected user input when creating a task.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Title is empty or whitespace only
    #[error("Task title must not be blank")]
    EmptyTitle,

    /// Duration is zero
    #[error("Duration must be at least 1 minute")]
    NonPositiveDuration,

    /// Duration input is not a whole number of minutes
    #[error("Invalid duration '{0}': expected a positive whole number of minutes")]
    InvalidMinutes(String),
}

/// Errors surfaced by [`crate::SessionHandle`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The session loop has stopped (disposed or panicked)
    #[error("Session runtime is no longer running")]
    Closed,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
