//! Core error types for slidepace-core.
//!
//! This module defines the error hierarchy using thiserror. Conditions the
//! monitor treats as ordinary states (no presentation open, presentation
//! application not running) are modelled with `Option` and never appear here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for slidepace-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Schedule file errors
    #[error("Schedule error: {0}")]
    Schedule(#[from] ScheduleError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rejected command input
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Monitor lifecycle errors
    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Schedule-file errors.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// Failed to read the schedule file
    #[error("Failed to read schedule file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The schedule file is not a valid schedule document
    #[error("Malformed schedule file {path}: {message}")]
    Malformed { path: PathBuf, message: String },

    /// Failed to write the schedule file
    #[error("Failed to write schedule file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not take the exclusive lock guarding a schedule file
    #[error("Failed to lock schedule file {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Legacy migration failed
    #[error("Failed to migrate legacy schedule {path}: {message}")]
    Migration { path: PathBuf, message: String },

    /// Refused to persist a schedule that breaks its invariants
    #[error("Refusing to write invalid schedule: {0}")]
    Invalid(#[from] ValidationError),

    /// The slide count needed to build a schedule is unknown
    #[error("Cannot build a schedule without a slide count")]
    UnknownSlideCount,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be prepared
    #[error("Cannot prepare data directory {path}: {source}")]
    DataDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Planned time is negative or not a finite number
    #[error("Planned time for slide {slide} must be a non-negative number, got {value}")]
    InvalidPlannedTime { slide: u32, value: f64 },

    /// Slide number outside the presentation
    #[error("Slide {slide} is out of range (1..={total})")]
    SlideOutOfRange { slide: u32, total: u32 },

    /// Slide key that does not parse to a slide number
    #[error("'{0}' is not a valid slide number")]
    InvalidSlideKey(String),

    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),
}

/// Monitor lifecycle errors.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("monitoring is already active")]
    AlreadyActive,

    #[error("monitoring is not active")]
    NotActive,

    #[error("no schedule loaded; load or create a schedule first")]
    NoSchedule,

    #[error("no presentation document is open")]
    NoDocument,

    #[error("monitor state lock poisoned")]
    LockPoisoned,

    #[error("presentation control did not answer within {0:?}")]
    ControlTimeout(std::time::Duration),

    #[error("presentation control call failed: {0}")]
    ControlTask(String),

    #[error("background schedule task failed: {0}")]
    ScheduleTask(String),

    #[error("presentation control rejected '{0}'")]
    ControlRejected(&'static str),

    #[error("no valid updates were processed: {}", .0.join("; "))]
    NothingApplied(Vec<String>),
}

impl<T> From<std::sync::PoisonError<T>> for MonitorError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        MonitorError::LockPoisoned
    }
}

impl<T> From<std::sync::PoisonError<T>> for CoreError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        CoreError::Monitor(MonitorError::LockPoisoned)
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
