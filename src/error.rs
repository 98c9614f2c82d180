//! Error types for MBP-10 replay.
//!
//! Only startup and I/O failures are errors. Malformed fields and
//! operations on unknown orders are recovered locally and never reach here.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Main error type for replay operations.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Input path does not exist or cannot be opened
    #[error("Could not open input file {}: {source}", path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Output file cannot be created
    #[error("Could not create output file {}: {source}", path.display())]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV framing or a read failure underneath the CSV reader
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Read/write failure on an open stream
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Book aggregates disagree with the order index
    #[error("Book inconsistency: {0}")]
    InconsistentState(String),

    /// Failed to serialize a run summary
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with context
    #[error("Error: {0}")]
    Generic(String),
}

impl ReplayError {
    /// Create a generic error from any string-like type.
    pub fn generic(msg: impl Into<String>) -> Self {
        ReplayError::Generic(msg.into())
    }

    /// True for the failures that abort a run before any book state exists.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            ReplayError::InputNotFound { .. } | ReplayError::OutputCreate { .. }
        )
    }
}

impl From<String> for ReplayError {
    fn from(err: String) -> Self {
        ReplayError::Generic(err)
    }
}

impl From<&str> for ReplayError {
    fn from(err: &str) -> Self {
        ReplayError::Generic(err.to_string())
    }
}
