//! Error types for the qracer crate

use thiserror::Error;

/// Main error type for the qracer crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("feature '{feature}' value {value} is outside its discretization range (saturated to bucket {bucket})")]
    Domain {
        feature: &'static str,
        value: f64,
        bucket: usize,
    },

    #[error("state {state} is not part of the enumerated state space (levels {levels:?})")]
    UnknownState { state: String, levels: Vec<usize> },

    #[error("invalid action {action} (table has {num_actions} actions)")]
    InvalidAction { action: usize, num_actions: usize },

    #[error("refusing to store non-finite value {value} at state {state}, action {action}")]
    NonFiniteValue {
        state: String,
        action: usize,
        value: f64,
    },

    #[error("non-finite softmax term at state {state}: value {value}, temperature {temperature}")]
    Numeric {
        state: String,
        value: f64,
        temperature: f64,
    },

    #[error("sensor vector has {got} readings, expected {expected}")]
    SensorLength { expected: usize, got: usize },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },

    #[error("unknown snapshot format tag '{found}'")]
    UnknownSnapshotFormat { found: String },

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedSnapshotVersion { found: u32, expected: u32 },

    #[error("snapshot levels {found:?} do not match the running discretizer levels {expected:?}")]
    LevelMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    #[error("corrupt snapshot: {reason}")]
    CorruptSnapshot { reason: String },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    /// Whether the error originates from reading or writing a table snapshot.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Io { .. }
                | Error::SerializationContext { .. }
                | Error::UnknownSnapshotFormat { .. }
                | Error::UnsupportedSnapshotVersion { .. }
                | Error::LevelMismatch { .. }
                | Error::CorruptSnapshot { .. }
        )
    }
}
