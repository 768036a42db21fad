//! Error types for discuss

use std::time::Duration;
use thiserror::Error;

/// Main error type for discuss
#[derive(Debug, Error)]
pub enum DiscussError {
    /// Malformed or contradictory input (wrong-post parent, cycle, blank body)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Backing store unreachable or failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Store call exceeded its deadline
    #[error("Storage error: {operation} timed out after {}ms", .deadline.as_millis())]
    Timeout {
        operation: &'static str,
        deadline: Duration,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DiscussError>,
    },
}

impl DiscussError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DiscussError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error came from the persistence layer rather than the input
    pub fn is_storage(&self) -> bool {
        match self {
            DiscussError::Storage(_) | DiscussError::Timeout { .. } | DiscussError::Io(_) => true,
            DiscussError::WithContext { source, .. } => source.is_storage(),
            _ => false,
        }
    }

    /// Whether this error is a missing-record failure
    pub fn is_not_found(&self) -> bool {
        match self {
            DiscussError::NotFound(_) => true,
            DiscussError::WithContext { source, .. } => source.is_not_found(),
            _ => false,
        }
    }
}

/// Failure surfaced by a query entry point.
///
/// `operation` is the external entry-point name (`findManyByPostID`, ...).
#[derive(Debug, Error)]
#[error("Comment {operation} failed: {source}")]
pub struct QueryError {
    pub operation: &'static str,
    #[source]
    pub source: DiscussError,
}

impl QueryError {
    pub fn new(operation: &'static str, source: DiscussError) -> Self {
        Self { operation, source }
    }
}

/// Result type alias for discuss
pub type Result<T> = std::result::Result<T, DiscussError>;

/// Result type alias for query entry points
pub type QueryResult<T> = std::result::Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DiscussError::NotFound("comment abc".to_string());
        assert_eq!(err.to_string(), "Not found: comment abc");
    }

    #[test]
    fn test_error_with_context() {
        let err = DiscussError::Validation("body is blank".to_string());
        let err = err.with_context("Failed to insert comment");
        assert!(err.to_string().contains("Failed to insert comment"));
        assert!(!err.is_storage());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: DiscussError = io_err.into();
        assert!(matches!(err, DiscussError::Io(_)));
        assert!(err.is_storage());
    }

    #[test]
    fn test_timeout_is_storage() {
        let err = DiscussError::Timeout {
            operation: "find_by_post",
            deadline: Duration::from_millis(250),
        };
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "Storage error: find_by_post timed out after 250ms");
    }

    #[test]
    fn test_query_error_display() {
        let err = QueryError::new(
            "findManyByParentID",
            DiscussError::Storage("connection refused".to_string()),
        );
        assert_eq!(
            err.to_string(),
            "Comment findManyByParentID failed: Storage error: connection refused"
        );
    }

    #[test]
    fn test_not_found_through_context() {
        let err = DiscussError::NotFound("x".to_string()).with_context("loading parent");
        assert!(err.is_not_found());
    }
}
