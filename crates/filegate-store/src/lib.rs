//! # Filegate Store
//!
//! Object storage layer for the filegate file gateway.
//!
//! This crate provides:
//! - **Object operations**: Put, get, delete, list and batch-delete keys
//! - **S3 backend**: Any S3-compatible service through the AWS SDK
//! - **Memory backend**: A process-local store for tests and development
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Gateway Operations           │
//! ├─────────────────────────────────────────┤
//! │           ObjectStore Trait             │
//! ├────────────────────┬────────────────────┤
//! │   S3ObjectStore    │ MemoryObjectStore  │
//! ├────────────────────┴────────────────────┤
//! │      S3 bucket      │   BTreeMap        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use filegate_store::{MemoryObjectStore, ObjectMeta, ObjectStore};
//!
//! let store = MemoryObjectStore::new();
//! store.put_object("docs/a.txt", data, ObjectMeta::new("text/plain", 5)).await?;
//! let object = store.get_object("docs/a.txt").await?;
//! ```

pub mod error;
pub mod flexible;
pub mod memory;
pub mod s3;

pub use error::{Result, StoreError};
pub use flexible::FlexibleObjectStore;
pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::BTreeMap;

/// Default number of keys returned by one listing call
pub const DEFAULT_LIST_PAGE_SIZE: usize = 1000;

/// Content type used when nothing better is known
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Attributes stored alongside an object
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    /// MIME type served back on retrieval
    pub content_type: String,
    /// Body length in bytes
    pub content_length: u64,
    /// Informational user metadata
    pub metadata: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(content_type: impl Into<String>, content_length: u64) -> Self {
        Self {
            content_type: content_type.into(),
            content_length,
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a user metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// An object read back from the store
#[derive(Clone, Debug)]
pub struct StoredObject {
    pub data: Bytes,
    /// Content type as reported by the store, if any
    pub content_type: Option<String>,
}

/// One page of a prefix listing
#[derive(Clone, Debug, Default)]
pub struct ListPage {
    pub keys: Vec<String>,
    /// Token for the next page; `None` once the listing is exhausted
    pub next_token: Option<String>,
}

/// Trait for object storage backends
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store an object under `key`, replacing any previous value
    async fn put_object(&self, key: &str, data: Bytes, meta: ObjectMeta) -> Result<()>;

    /// Retrieve an object; `StoreError::NotFound` if the key is absent
    async fn get_object(&self, key: &str) -> Result<StoredObject>;

    /// Delete an object. Deleting an absent key succeeds.
    async fn delete_object(&self, key: &str) -> Result<()>;

    /// List a single page of keys starting with `prefix`
    async fn list_objects(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage>;

    /// Delete many keys at once. Absent keys are ignored.
    async fn delete_objects(&self, keys: &[String]) -> Result<()>;
}
