//! HTTP route definitions

use crate::{handlers, middleware, AppState, GatewayConfig};
use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/{directory}/upload/files", post(handlers::upload_files))
        .route(
            "/{directory}/retrieve/files/{filename}",
            get(handlers::fetch_file),
        )
        .route(
            "/{directory}/remove/files/{filename}",
            delete(handlers::delete_file),
        )
        .route("/remove/folders/{directory}", delete(handlers::delete_folder));

    // Innermost first: the limiter keys on the principal set by auth
    if let Some(rate_limiter) = middleware::create_rate_limiter(state.config.rate_limit_rps) {
        router = router.layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router = router.layer(axum_middleware::from_fn_with_state(
        Arc::clone(&state),
        middleware::auth_middleware,
    ));

    // Preflights are answered here, still inside request id and logging
    if let Some(cors) = cors_layer(&state.config) {
        router = router.layer(cors);
    }

    router
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(state.config.max_request_size))
        .with_state(state)
}

fn cors_layer(config: &GatewayConfig) -> Option<CorsLayer> {
    if !config.cors_enabled {
        return None;
    }

    if config.cors_origins.iter().any(|o| o == "*") {
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        );
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}
