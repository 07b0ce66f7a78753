//! S3 object store backed by the AWS SDK
//!
//! Works against AWS S3 and S3-compatible services (MinIO, Ceph RGW, ...)
//! through an endpoint override with path-style addressing.

use crate::{ListPage, ObjectMeta, ObjectStore, Result, StoreError, StoredObject};
use crate::DEFAULT_LIST_PAGE_SIZE;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Maximum number of keys accepted by one DeleteObjects request
pub const MAX_DELETE_BATCH: usize = 1000;

/// S3 connection settings
#[derive(Clone)]
pub struct S3Config {
    /// Bucket holding every object the gateway serves
    pub bucket: String,
    /// Signing region
    pub region: String,
    /// Endpoint override for S3-compatible services
    pub endpoint: Option<String>,
    /// Static access key; the default credential chain is used when unset
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Use `https://host/bucket/key` instead of virtual-hosted addressing
    pub force_path_style: bool,
    /// Keys requested per listing call
    pub page_size: usize,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            page_size: DEFAULT_LIST_PAGE_SIZE,
        }
    }
}

impl fmt::Debug for S3Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .field("force_path_style", &self.force_path_style)
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// An object store living in a single S3 bucket
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    page_size: i32,
}

impl S3ObjectStore {
    /// Build an S3 client from the given settings
    pub async fn new(config: S3Config) -> Result<Self> {
        if config.bucket.trim().is_empty() {
            return Err(StoreError::Configuration("bucket name is empty".to_string()));
        }

        let region = Region::new(config.region.clone());
        let mut builder = match (&config.access_key_id, &config.secret_access_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "filegate-static");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .region(region)
                    .credentials_provider(credentials)
            }
            (None, None) => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(region)
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            }
            _ => {
                return Err(StoreError::Configuration(
                    "access key id and secret access key must be set together".to_string(),
                ))
            }
        };

        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        builder = builder.force_path_style(config.force_path_style);

        Ok(Self::from_client(Client::from_conf(builder.build()), &config))
    }

    /// Wrap an already configured client
    pub fn from_client(client: Client, config: &S3Config) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            page_size: i32::try_from(config.page_size.clamp(1, DEFAULT_LIST_PAGE_SIZE))
                .unwrap_or(1000),
        }
    }

    /// Bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn sdk_error<E>(operation: &'static str, err: E) -> StoreError
where
    E: std::error::Error,
{
    StoreError::service(operation, DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, data, meta), fields(bucket = %self.bucket, size = data.len()))]
    async fn put_object(&self, key: &str, data: Bytes, meta: ObjectMeta) -> Result<()> {
        let length = i64::try_from(meta.content_length)
            .map_err(|_| StoreError::service("PutObject", "content length out of range"))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(meta.content_type)
            .content_length(length)
            .set_metadata(Some(meta.metadata.into_iter().collect()))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| sdk_error("PutObject", e))?;

        debug!("Object stored");
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> Result<StoredObject> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let no_such_key = err
                    .as_service_error()
                    .map(|e| e.is_no_such_key())
                    .unwrap_or(false);
                let status_404 = err
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);
                if no_such_key || status_404 {
                    return Err(StoreError::NotFound(key.to_string()));
                }
                return Err(sdk_error("GetObject", err));
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Body(e.to_string()))?
            .into_bytes();

        Ok(StoredObject { data, content_type })
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("DeleteObject", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn list_objects(&self, prefix: &str, continuation: Option<&str>) -> Result<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(self.page_size)
            .set_continuation_token(continuation.map(str::to_string))
            .send()
            .await
            .map_err(|e| sdk_error("ListObjectsV2", e))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        let next_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ListPage { keys, next_token })
    }

    #[instrument(skip(self, keys), fields(bucket = %self.bucket, count = keys.len()))]
    async fn delete_objects(&self, keys: &[String]) -> Result<()> {
        let mut failed = Vec::new();

        for batch in keys.chunks(MAX_DELETE_BATCH) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| StoreError::service("DeleteObjects", e.to_string()))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| StoreError::service("DeleteObjects", e.to_string()))?;

            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| sdk_error("DeleteObjects", e))?;

            for error in output.errors() {
                warn!(
                    key = ?error.key(),
                    code = ?error.code(),
                    message = ?error.message(),
                    "Key not removed by batch delete"
                );
                failed.extend(error.key().map(str::to_string));
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(StoreError::PartialDelete { failed })
        }
    }
}
