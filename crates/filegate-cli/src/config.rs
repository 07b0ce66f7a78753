//! Gateway configuration

use crate::multipart::UploadLimits;
use filegate_core::GatewayOptions;
use filegate_store::{S3Config, DEFAULT_LIST_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Gateway server configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// S3 bucket holding all directories
    pub bucket: Option<String>,
    /// S3 region
    pub region: String,
    /// Endpoint override for S3-compatible services
    pub endpoint: Option<String>,
    /// Static S3 access key (default AWS credential chain when unset)
    pub access_key_id: Option<String>,
    /// Static S3 secret key
    #[serde(skip_serializing)]
    pub secret_access_key: Option<String>,
    /// Path-style S3 addressing
    pub force_path_style: bool,
    /// Use in-memory storage (for testing/development)
    pub use_memory_store: bool,
    /// Client whose entry in `resource_access` carries the caller's roles
    pub client_id: String,
    /// HS256 secret for token validation
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,
    /// RS256 public key (PEM file) for token validation
    pub jwt_public_key_path: Option<PathBuf>,
    /// Required token issuer
    pub jwt_issuer: Option<String>,
    /// Required token audience
    pub jwt_audience: Option<String>,
    /// Enable authentication
    pub auth_enabled: bool,
    /// Rate limit (requests per second per caller), 0 disables
    pub rate_limit_rps: u32,
    /// Maximum number of files in one upload
    pub max_upload_count: usize,
    /// Maximum request body size (bytes)
    pub max_request_size: usize,
    /// Maximum size of a single buffered file part (bytes)
    pub max_part_size: usize,
    /// Files of one upload stored concurrently
    pub upload_concurrency: usize,
    /// Keys requested per listing call
    pub list_page_size: usize,
    /// Enable CORS
    pub cors_enabled: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            bucket: None,
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            use_memory_store: false,
            client_id: "filegate".to_string(),
            jwt_secret: None,
            jwt_public_key_path: None,
            jwt_issuer: None,
            jwt_audience: None,
            auth_enabled: true,
            rate_limit_rps: 100,
            max_upload_count: 10,
            max_request_size: 100 * 1024 * 1024, // 100 MiB
            max_part_size: 50 * 1024 * 1024,     // 50 MiB
            upload_concurrency: 4,
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// S3 settings, if a bucket is configured
    pub fn s3_config(&self) -> Option<S3Config> {
        let bucket = self.bucket.clone()?;
        Some(S3Config {
            bucket,
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            access_key_id: self.access_key_id.clone(),
            secret_access_key: self.secret_access_key.clone(),
            force_path_style: self.force_path_style,
            page_size: self.list_page_size,
        })
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            upload_concurrency: self.upload_concurrency.max(1),
        }
    }

    pub fn upload_limits(&self) -> UploadLimits {
        UploadLimits {
            max_parts: self.max_upload_count,
            max_part_size: self.max_part_size,
        }
    }
}
