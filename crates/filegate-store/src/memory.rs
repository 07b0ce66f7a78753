//! In-memory object store for testing and development

use crate::{ListPage, ObjectMeta, ObjectStore, Result, StoreError, StoredObject};
use crate::DEFAULT_LIST_PAGE_SIZE;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Clone, Debug)]
struct MemoryObject {
    data: Bytes,
    meta: ObjectMeta,
}

/// An in-memory object store.
///
/// Keys are kept ordered so listings page the same way an S3 bucket does:
/// the continuation token is the last key of the previous page.
#[derive(Clone)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, MemoryObject>>>,
    page_size: usize,
    batch_deletes: Arc<AtomicUsize>,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_LIST_PAGE_SIZE)
    }

    /// Create a store whose listings return at most `page_size` keys per call
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: page_size.max(1),
            batch_deletes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of objects stored
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// All keys, in order
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Stored attributes of an object
    pub fn meta(&self, key: &str) -> Option<ObjectMeta> {
        self.objects.read().get(key).map(|o| o.meta.clone())
    }

    /// Number of `delete_objects` calls served so far
    pub fn batch_delete_calls(&self) -> usize {
        self.batch_deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, key: &str, data: Bytes, meta: ObjectMeta) -> Result<()> {
        self.objects
            .write()
            .insert(key.to_string(), MemoryObject { data, meta });
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        self.objects
            .read()
            .get(key)
            .map(|o| StoredObject {
                data: o.data.clone(),
                content_type: Some(o.meta.content_type.clone()).filter(|ct| !ct.is_empty()),
            })
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        self.objects.write().remove(key);
        Ok(())
    }

    async fn list_objects(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage> {
        let objects = self.objects.read();
        let start = match continuation {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut keys: Vec<String> = objects
            .range((start, Bound::Unbounded))
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(prefix))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        let next_token = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        self.batch_deletes.fetch_add(1, Ordering::SeqCst);
        let mut objects = self.objects.write();
        for key in keys {
            objects.remove(key);
        }
        Ok(())
    }
}
