//! Error types for feedhub.

use thiserror::Error;

/// Common error type for feedhub.
#[derive(Error, Debug)]
pub enum FeedhubError {
    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for FeedhubError {
    fn from(e: sqlx::Error) -> Self {
        FeedhubError::Database(e.to_string())
    }
}

/// Result type alias for feedhub operations.
pub type Result<T> = std::result::Result<T, FeedhubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = FeedhubError::Validation("url is empty".to_string());
        assert_eq!(err.to_string(), "validation error: url is empty");
    }

    #[test]
    fn test_not_found_error_display() {
        let err = FeedhubError::NotFound("feed".to_string());
        assert_eq!(err.to_string(), "feed not found");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = FeedhubError::Conflict("feed url already registered".to_string());
        assert_eq!(err.to_string(), "conflict: feed url already registered");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FeedhubError = io_err.into();
        assert!(matches!(err, FeedhubError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: FeedhubError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, FeedhubError::Database(_)));
    }
}
