//! Core error types for focusflow-core.
//!
//! Persistence, notification, and audio failures are deliberately soft:
//! the components log and degrade rather than surface these as errors.
//! The types here cover the remaining hard failures (opening storage,
//! rejecting invalid input).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusflow-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Durable storage errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Durable storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Read or write against the kv table failed
    #[error("Store query failed: {0}")]
    QueryFailed(String),

    /// The data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::QueryFailed(err.to_string())
    }
}

/// Validation errors for user-supplied values.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Hour outside 0-23 or minute outside 0-59
    #[error("Invalid clock time {hour:02}:{minute:02}")]
    InvalidClockTime { hour: u32, minute: u32 },

    /// A time-of-day string that is not zero-padded "HH:MM"
    #[error("Invalid time '{0}': expected HH:MM")]
    InvalidTimeFormat(String),

    /// An unrecognized weekday name
    #[error("Invalid weekday '{0}'")]
    InvalidWeekday(String),

    /// A required text field was empty
    #[error("'{0}' must not be empty")]
    EmptyField(&'static str),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_error_wraps_domain_errors() {
        let e: CoreError = StoreError::DataDir("permission denied".into()).into();
        assert_eq!(
            e.to_string(),
            "Store error: Data directory unavailable: permission denied"
        );
        let e: CoreError = ValidationError::EmptyField("subject").into();
        assert_eq!(e.to_string(), "Validation error: 'subject' must not be empty");
    }
}
