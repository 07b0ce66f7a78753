//! Error types for the filegate-core crate

use filegate_store::StoreError;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in gateway operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Directory path rejected before touching storage
    #[error("invalid directory {directory:?}: {reason}")]
    InvalidDirectory {
        directory: String,
        reason: &'static str,
    },

    /// Filename rejected before touching storage
    #[error("invalid filename {filename:?}: {reason}")]
    InvalidFilename {
        filename: String,
        reason: &'static str,
    },

    /// Upload request carried no file parts
    #[error("no files to upload")]
    NoParts,

    /// Object not found
    #[error("object not found: {key}")]
    ObjectNotFound { key: String },

    /// The object store failed
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoreError {
    /// Whether the caller sent something invalid (as opposed to a storage fault)
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidDirectory { .. } | Self::InvalidFilename { .. } | Self::NoParts
        )
    }
}
