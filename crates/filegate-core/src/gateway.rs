//! Gateway operations: upload, fetch, delete-file, delete-folder

use crate::key::{build_key, folder_prefix, BuiltKey, NamingMode, StorageKey};
use crate::object::{Blob, FileRemoval, FolderRemoval, UploadPart};
use crate::{CoreError, Result};
use filegate_store::{ObjectMeta, ObjectStore, StoreError, OCTET_STREAM};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Tuning for gateway operations
#[derive(Clone, Debug)]
pub struct GatewayOptions {
    /// Parts of one upload stored concurrently
    pub upload_concurrency: usize,
}

impl Default for GatewayOptions {
    fn default() -> Self {
        Self {
            upload_concurrency: 4,
        }
    }
}

/// Directory-scoped file operations over an object store
pub struct Gateway<S: ObjectStore> {
    store: Arc<S>,
    options: GatewayOptions,
}

impl<S: ObjectStore> Gateway<S> {
    pub fn new(store: Arc<S>, options: GatewayOptions) -> Self {
        Self { store, options }
    }

    /// The underlying object store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Store every part under `directory` and return the stored filenames.
    ///
    /// All keys are validated before the first byte is written. Parts are
    /// stored with bounded concurrency and the result keeps input order. The
    /// first failing part aborts the request; parts already stored are left
    /// in place.
    #[instrument(skip(self, parts), fields(parts = parts.len()))]
    pub async fn upload(
        &self,
        directory: &str,
        mode: NamingMode,
        parts: Vec<UploadPart>,
    ) -> Result<Vec<String>> {
        if parts.is_empty() {
            return Err(CoreError::NoParts);
        }

        let planned = parts
            .into_iter()
            .map(|part| build_key(directory, &part.filename, mode).map(|built| (built, part)))
            .collect::<Result<Vec<_>>>()?;
        let total = planned.len();

        let mut results = stream::iter(planned)
            .map(|(built, part)| self.store_part(built, part))
            .buffered(self.options.upload_concurrency.max(1));

        let mut filenames = Vec::with_capacity(total);
        while let Some(result) = results.next().await {
            match result {
                Ok(filename) => filenames.push(filename),
                Err(e) => {
                    error!(
                        directory,
                        stored = filenames.len(),
                        total,
                        error = %e,
                        "Upload aborted"
                    );
                    return Err(e);
                }
            }
        }

        Ok(filenames)
    }

    async fn store_part(&self, built: BuiltKey, part: UploadPart) -> Result<String> {
        let BuiltKey { key, content_type } = built;
        let size = part.data.len() as u64;
        let meta = ObjectMeta::new(content_type.clone(), size)
            .with_metadata("filename", key.filename())
            .with_metadata("content-type", content_type)
            .with_metadata("content-length", size.to_string());

        debug!(key = %key, size, "Uploading file");
        self.store
            .put_object(&key.to_string(), part.data, meta)
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "Failed to store file");
                e
            })?;

        info!(filename = %key.filename(), key = %key, "File uploaded");
        Ok(key.filename().to_string())
    }

    /// Read an object back
    #[instrument(skip(self))]
    pub async fn fetch(&self, directory: &str, filename: &str) -> Result<Blob> {
        let key = StorageKey::new(directory, filename)?;

        match self.store.get_object(&key.to_string()).await {
            Ok(object) => {
                let content_type = object
                    .content_type
                    .filter(|ct| !ct.trim().is_empty())
                    .unwrap_or_else(|| OCTET_STREAM.to_string());
                info!(key = %key, size = object.data.len(), "File fetched");
                Ok(Blob {
                    content: object.data,
                    content_type,
                })
            }
            Err(e) if e.is_not_found() => {
                info!(key = %key, "File not found");
                Err(CoreError::ObjectNotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => {
                error!(key = %key, error = %e, "Failed to fetch file");
                Err(e.into())
            }
        }
    }

    /// Delete one object. Deleting a key that does not exist succeeds.
    #[instrument(skip(self))]
    pub async fn delete_file(&self, directory: &str, filename: &str) -> Result<FileRemoval> {
        let key = StorageKey::new(directory, filename)?;

        self.store
            .delete_object(&key.to_string())
            .await
            .map_err(|e| {
                error!(key = %key, error = %e, "Failed to delete file");
                e
            })?;

        info!(key = %key, "File deleted");
        Ok(FileRemoval { key })
    }

    /// Delete every object under `folder/`.
    ///
    /// The listing is followed page by page until exhausted, then all keys
    /// go out in a single batch delete. An empty folder is a no-op.
    #[instrument(skip(self))]
    pub async fn delete_folder(&self, folder: &str) -> Result<FolderRemoval> {
        let prefix = folder_prefix(folder)?;
        let keys = self.list_all(&prefix).await.map_err(|e| {
            error!(prefix = %prefix, error = %e, "Failed to list folder");
            e
        })?;

        if keys.is_empty() {
            info!(folder, "Folder is empty or does not exist");
            return Ok(FolderRemoval {
                folder: folder.to_string(),
                removed: 0,
            });
        }

        self.store.delete_objects(&keys).await.map_err(|e| {
            error!(prefix = %prefix, count = keys.len(), error = %e, "Failed to delete folder");
            e
        })?;

        info!(folder, removed = keys.len(), "Folder deleted");
        Ok(FolderRemoval {
            folder: folder.to_string(),
            removed: keys.len(),
        })
    }

    async fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let page = self.store.list_objects(prefix, token.as_deref()).await?;
            keys.extend(page.keys);

            match page.next_token {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    return Err(StoreError::service(
                        "ListObjects",
                        "continuation token did not advance",
                    )
                    .into());
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }

        debug!(prefix, count = keys.len(), "Folder listed");
        Ok(keys)
    }
}
