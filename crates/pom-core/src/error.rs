//! Error type shared by the core projectors and codecs.

use thiserror::Error;

/// Errors raised by core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A duration field was not `H:MM:SS` or `MM:SS`.
    #[error("invalid clock value: {0:?}")]
    InvalidClock(String),

    /// A date string matched none of the accepted patterns.
    #[error("not a date: {0:?}")]
    InvalidDate(String),

    /// The event rows contradict each other (e.g. a stop before its start).
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
