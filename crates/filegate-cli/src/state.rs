//! Application state

use crate::access::AccessPolicy;
use crate::auth::{RoleSet, TokenVerifier, ADMIN_ROLE};
use crate::config::GatewayConfig;
use anyhow::bail;
use chrono::{DateTime, Utc};
use filegate_core::Gateway;
use filegate_store::FlexibleObjectStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Object store (S3 or memory)
    pub store: Arc<FlexibleObjectStore>,
    /// Directory-scoped file operations
    pub gateway: Gateway<FlexibleObjectStore>,
    /// Absent only when authentication is disabled
    pub token_verifier: Option<TokenVerifier>,
    pub access_policy: AccessPolicy,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let store = if config.use_memory_store {
            info!("Using in-memory object store (data will not persist)");
            FlexibleObjectStore::memory(config.list_page_size)
        } else {
            let Some(s3_config) = config.s3_config() else {
                bail!("no bucket configured; set --bucket or use --memory-store");
            };
            info!(region = %s3_config.region, endpoint = ?s3_config.endpoint, "Connecting to S3");
            FlexibleObjectStore::s3(s3_config).await?
        };

        Self::with_store(config, store)
    }

    /// Build state around an already constructed store
    pub fn with_store(config: GatewayConfig, store: FlexibleObjectStore) -> anyhow::Result<Self> {
        if !store.is_persistent() {
            warn!("Storage mode: in-memory (NOT persistent - for development only)");
        }

        let token_verifier = TokenVerifier::from_config(&config)?;
        if config.auth_enabled && token_verifier.is_none() {
            bail!("authentication is enabled but neither a JWT secret nor a public key is configured");
        }

        let store = Arc::new(store);
        let gateway = Gateway::new(Arc::clone(&store), config.gateway_options());

        Ok(Self {
            config,
            store,
            gateway,
            token_verifier,
            access_policy: AccessPolicy::default(),
        })
    }
}

const ANONYMOUS_SUBJECT: &str = "anonymous";

/// Caller identity attached to each request
#[derive(Clone, Debug)]
pub struct Principal {
    /// Subject (from JWT sub claim)
    pub subject: String,
    pub display_name: Option<String>,
    pub roles: RoleSet,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Principal {
    /// Caller on an open path; no token was examined
    pub fn anonymous() -> Self {
        Self {
            subject: ANONYMOUS_SUBJECT.to_string(),
            display_name: None,
            roles: RoleSet::new(),
            expires_at: None,
        }
    }

    /// Principal used when authentication is disabled
    pub fn development() -> Self {
        Self {
            subject: "dev-user".to_string(),
            display_name: Some("Development User".to_string()),
            roles: RoleSet::from([ADMIN_ROLE.to_string()]),
            expires_at: None,
        }
    }

    /// True only for the placeholder attached on open paths
    pub fn is_anonymous(&self) -> bool {
        self.subject == ANONYMOUS_SUBJECT && self.expires_at.is_none() && self.roles.is_empty()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() > at)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ADMIN_ROLE)
    }
}
