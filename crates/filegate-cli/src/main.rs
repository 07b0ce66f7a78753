//! Filegate - directory-scoped file gateway over S3

use clap::Parser;
use filegate_cli::{run_server, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "filegate")]
#[command(about = "Directory-scoped file gateway over S3-compatible storage")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "FILEGATE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "FILEGATE_PORT")]
    port: u16,

    /// S3 bucket holding all directories
    #[arg(long, env = "S3_BUCKET")]
    bucket: Option<String>,

    /// S3 region
    #[arg(long, default_value = "us-east-1", env = "S3_REGION")]
    region: String,

    /// Endpoint for S3-compatible services (MinIO, Ceph, ...)
    #[arg(long, env = "S3_ENDPOINT")]
    endpoint: Option<String>,

    #[arg(long, env = "S3_ACCESS_KEY_ID")]
    access_key_id: Option<String>,

    #[arg(long, env = "S3_SECRET_ACCESS_KEY", hide_env_values = true)]
    secret_access_key: Option<String>,

    /// Use path-style bucket addressing
    #[arg(long, env = "S3_FORCE_PATH_STYLE")]
    force_path_style: bool,

    /// Use in-memory storage (for testing, data will not persist)
    #[arg(long, env = "FILEGATE_MEMORY_STORE")]
    memory_store: bool,

    /// Client whose roles are read from the token's resource_access claim
    #[arg(long, default_value = "filegate", env = "FILEGATE_CLIENT_ID")]
    client_id: String,

    /// JWT secret for HS256 token validation
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// PEM public key for RS256 token validation
    #[arg(long, env = "JWT_PUBLIC_KEY")]
    jwt_public_key: Option<PathBuf>,

    /// Required token issuer
    #[arg(long, env = "JWT_ISSUER")]
    jwt_issuer: Option<String>,

    /// Required token audience
    #[arg(long, env = "JWT_AUDIENCE")]
    jwt_audience: Option<String>,

    /// Disable authentication (for development only!)
    #[arg(long, env = "FILEGATE_NO_AUTH")]
    no_auth: bool,

    /// Requests per second per caller, 0 disables limiting
    #[arg(long, default_value = "100", env = "FILEGATE_RATE_LIMIT")]
    rate_limit: u32,

    /// Maximum number of files in one upload
    #[arg(long, default_value = "10", env = "FILEGATE_MAX_UPLOAD_COUNT")]
    max_upload_count: usize,

    /// Maximum request body size in bytes
    #[arg(long, default_value = "104857600", env = "FILEGATE_MAX_REQUEST_SIZE")]
    max_request_size: usize,

    /// Maximum size of one file in bytes
    #[arg(long, default_value = "52428800", env = "FILEGATE_MAX_PART_SIZE")]
    max_part_size: usize,

    /// Files of one upload stored in parallel
    #[arg(long, default_value = "4", env = "FILEGATE_UPLOAD_CONCURRENCY")]
    upload_concurrency: usize,

    /// Keys requested per storage listing call
    #[arg(long, default_value = "1000", env = "FILEGATE_LIST_PAGE_SIZE")]
    list_page_size: usize,

    /// Allowed CORS origins (comma separated, `*` for any)
    #[arg(long, value_delimiter = ',', default_value = "*", env = "FILEGATE_CORS_ORIGINS")]
    cors_origins: Vec<String>,

    /// Disable CORS headers
    #[arg(long, env = "FILEGATE_NO_CORS")]
    no_cors: bool,

    /// Enable debug logging
    #[arg(short, long, env = "FILEGATE_DEBUG")]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, env = "FILEGATE_LOG_JSON")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "filegate_cli={0},filegate_core={0},filegate_store={0},tower_http=debug",
            log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Filegate on {}:{}", args.host, args.port);

    if args.memory_store {
        tracing::warn!("Using in-memory storage - data will NOT persist!");
    } else if let Some(ref bucket) = args.bucket {
        tracing::info!(bucket = %bucket, region = %args.region, endpoint = ?args.endpoint, "S3 storage");
    }

    if args.no_auth {
        tracing::warn!("Authentication is DISABLED - for development only!");
    }

    run_server(args.into_config()).await
}

impl Args {
    fn into_config(self) -> GatewayConfig {
        GatewayConfig {
            host: self.host,
            port: self.port,
            bucket: self.bucket,
            region: self.region,
            endpoint: self.endpoint,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            force_path_style: self.force_path_style,
            use_memory_store: self.memory_store,
            client_id: self.client_id,
            jwt_secret: self.jwt_secret,
            jwt_public_key_path: self.jwt_public_key,
            jwt_issuer: self.jwt_issuer,
            jwt_audience: self.jwt_audience,
            auth_enabled: !self.no_auth,
            rate_limit_rps: self.rate_limit,
            max_upload_count: self.max_upload_count,
            max_request_size: self.max_request_size,
            max_part_size: self.max_part_size,
            upload_concurrency: self.upload_concurrency,
            list_page_size: self.list_page_size,
            cors_enabled: !self.no_cors,
            cors_origins: self.cors_origins,
        }
    }
}
