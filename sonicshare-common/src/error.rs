//! Common error types for SonicShare

use thiserror::Error;

/// Common result type for SonicShare operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across SonicShare crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding error (wraps csv::Error)
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Archive content could not be parsed even leniently
    #[error("Malformed archive: {0}")]
    Malformed(String),

    /// On-disk columns do not satisfy what an operation requires
    #[error("Schema drift: {0}")]
    SchemaDrift(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for errors that mean "nothing there yet" rather than a failure
    pub fn is_absence(&self) -> bool {
        match self {
            Error::NotFound(_) => true,
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
