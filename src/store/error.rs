//! Store error types

use thiserror::Error;

/// Errors that can occur in the measurement store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend cannot be reached (failed open, poisoned lock)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    /// Query execution failed
    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// Device name violates the 1-20 character contract
    #[error("Invalid device name: {0:?}")]
    InvalidDeviceName(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "Backend unavailable: connection refused");

        let err = StoreError::InvalidDeviceName("".to_string());
        assert_eq!(err.to_string(), "Invalid device name: \"\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let store_err: StoreError = io_err.into();
        assert!(matches!(store_err, StoreError::Io(_)));
    }
}
