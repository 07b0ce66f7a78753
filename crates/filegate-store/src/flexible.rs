//! Runtime-selected object store

use crate::{ListPage, MemoryObjectStore, ObjectMeta, ObjectStore, Result, S3Config, S3ObjectStore};
use crate::StoredObject;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

/// Object store chosen at startup: S3 in production, memory for development
#[derive(Clone)]
pub enum FlexibleObjectStore {
    /// S3 or an S3-compatible service
    S3(S3ObjectStore),
    /// In-memory storage (data is lost on restart)
    Memory(MemoryObjectStore),
}

impl FlexibleObjectStore {
    /// Connect to S3 with the given settings
    pub async fn s3(config: S3Config) -> Result<Self> {
        let store = S3ObjectStore::new(config).await?;
        info!(bucket = %store.bucket(), "Using S3 object store");
        Ok(Self::S3(store))
    }

    /// Process-local storage
    pub fn memory(page_size: usize) -> Self {
        Self::Memory(MemoryObjectStore::with_page_size(page_size))
    }

    /// Check if objects outlive the process
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::S3(_))
    }
}

#[async_trait]
impl ObjectStore for FlexibleObjectStore {
    async fn put_object(&self, key: &str, data: Bytes, meta: ObjectMeta) -> Result<()> {
        match self {
            Self::S3(store) => store.put_object(key, data, meta).await,
            Self::Memory(store) => store.put_object(key, data, meta).await,
        }
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        match self {
            Self::S3(store) => store.get_object(key).await,
            Self::Memory(store) => store.get_object(key).await,
        }
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        match self {
            Self::S3(store) => store.delete_object(key).await,
            Self::Memory(store) => store.delete_object(key).await,
        }
    }

    async fn list_objects(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage> {
        match self {
            Self::S3(store) => store.list_objects(prefix, continuation).await,
            Self::Memory(store) => store.list_objects(prefix, continuation).await,
        }
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        match self {
            Self::S3(store) => store.delete_objects(keys).await,
            Self::Memory(store) => store.delete_objects(keys).await,
        }
    }
}
