//! Core error types for dutyplan-core.
//!
//! Errors are layered the same way throughout the crate: each concern
//! (input validation, planning, configuration, storage) has its own enum,
//! and [`CoreError`] wraps them for callers that don't care which layer failed.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for dutyplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Internal planner failures
    #[error("Planning error: {0}")]
    Planning(#[from] PlanningError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// No stored trip with this id
    #[error("Trip not found: {0}")]
    TripNotFound(String),

    /// A stored row could not be decoded back into the model
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: String, message: String },
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
///
/// Raised before any planning happens; a trip that fails validation never
/// produces a partial plan.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Distance is negative, NaN or infinite
    #[error("Invalid trip distance: {0} (must be a finite number >= 0)")]
    InvalidDistance(f64),

    /// Cycle hours outside 0..=cycle cap
    #[error("Invalid cycle hours used: {used} (must be between 0 and {cap})")]
    CycleHoursOutOfRange { used: f64, cap: f64 },

    /// A regulatory rule value is unusable
    #[error("Invalid rule '{field}': {message}")]
    InvalidRule { field: String, message: String },

    /// Coordinate outside the valid lat/lon range
    #[error("Invalid coordinate ({lat}, {lon})")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// Not enough waypoints to form a route
    #[error("A route needs at least 2 waypoints, got {0}")]
    TooFewWaypoints(usize),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Internal planner failures.
///
/// These indicate a broken invariant rather than bad input: the same input
/// always fails the same way.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    /// Arithmetic produced a negative or NaN duration
    #[error("Day {day}: computed a non-finite or negative duration ({hours}h) for {what}")]
    NonFiniteDuration { day: u32, what: String, hours: f64 },

    /// A day could neither make progress nor be resolved by a restart
    #[error("Day {day}: no progress possible with {cycle_available:.2}h of cycle available")]
    NoProgress { day: u32, cycle_available: f64 },

    /// Planning loop exceeded its iteration cap
    #[error("Planning did not finish within {limit} days ({miles_remaining:.1} mi remaining)")]
    IterationLimit { limit: usize, miles_remaining: f64 },
}

// Helper implementations for converting from other error types

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
