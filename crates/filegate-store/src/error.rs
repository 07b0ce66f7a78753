//! Error types for the filegate-store crate

use thiserror::Error;

/// Result type alias using `StoreError`
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during object storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object not found
    #[error("object not found: {0}")]
    NotFound(String),

    /// The storage service rejected or failed the request
    #[error("{operation} failed: {message}")]
    Service {
        operation: &'static str,
        message: String,
    },

    /// Some keys of a batch delete were not removed
    #[error("batch delete left {} key(s) behind", .failed.len())]
    PartialDelete { failed: Vec<String> },

    /// Reading a response body failed
    #[error("body error: {0}")]
    Body(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl StoreError {
    /// Shorthand for a service failure
    pub fn service(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Service {
            operation,
            message: message.into(),
        }
    }

    /// Whether this error means the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
