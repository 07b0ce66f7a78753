//! Values exchanged with gateway operations

use crate::key::StorageKey;
use bytes::Bytes;

/// One file of an upload request
#[derive(Clone, Debug)]
pub struct UploadPart {
    /// Filename as sent by the client
    pub filename: String,
    /// Full part content, already buffered
    pub data: Bytes,
}

impl UploadPart {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// A retrieved object
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub content: Bytes,
    pub content_type: String,
}

/// Outcome of removing a single file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRemoval {
    pub key: StorageKey,
}

impl FileRemoval {
    pub fn message(&self) -> String {
        format!("File [{}] deleted successfully", self.key.filename())
    }
}

/// Outcome of removing every object under a folder
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FolderRemoval {
    pub folder: String,
    /// Number of objects that were listed and deleted
    pub removed: usize,
}

impl FolderRemoval {
    pub fn message(&self) -> String {
        format!("Folder [{}] deleted successfully", self.folder)
    }
}
