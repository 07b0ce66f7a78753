//! HTTP middleware for authentication, rate limiting, etc.

use crate::auth::{claims_to_principal, extract_bearer_token};
use crate::state::Principal;
use crate::{ApiError, AppState, ErrorCode};
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use governor::{state::keyed::DefaultKeyedStateStore, Quota, RateLimiter};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

/// Header carrying the per-request identifier
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Rate limiter type
pub type KeyedRateLimiter =
    RateLimiter<String, DefaultKeyedStateStore<String>, governor::clock::DefaultClock>;

/// Create a rate limiter; `None` when limiting is disabled
pub fn create_rate_limiter(requests_per_second: u32) -> Option<Arc<KeyedRateLimiter>> {
    let rps = NonZeroU32::new(requests_per_second)?;
    Some(Arc::new(RateLimiter::keyed(Quota::per_second(rps))))
}

/// Authentication and authorization middleware
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    if !state.access_policy.requires_authentication(&method, &path) {
        request.extensions_mut().insert(Principal::anonymous());
        return Ok(next.run(request).await);
    }

    let principal = if state.config.auth_enabled {
        authenticate(&state, &request)?
    } else {
        Principal::development()
    };

    if !state.access_policy.is_authorized(&principal.roles, &method, &path) {
        warn!(
            subject = %principal.subject,
            method = %method,
            path = %path,
            "Insufficient role for request"
        );
        return Err(ApiError::new(ErrorCode::AccessDenied, "Access denied"));
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

fn authenticate(state: &AppState, request: &Request<Body>) -> Result<Principal, ApiError> {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::new(ErrorCode::Unauthorized, "Authentication required"))?;

    let token = extract_bearer_token(header).ok_or_else(|| {
        ApiError::new(ErrorCode::Unauthorized, "Invalid Authorization header format")
    })?;

    let verifier = state
        .token_verifier
        .as_ref()
        .ok_or_else(|| ApiError::Internal("token verifier not configured".to_string()))?;

    let claims = verifier.verify(token)?;
    let principal = claims_to_principal(&claims, &state.config.client_id);

    if principal.is_expired() {
        return Err(ApiError::new(ErrorCode::Unauthorized, "Token has expired"));
    }

    debug!(subject = %principal.subject, "Authenticated request");
    Ok(principal)
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<KeyedRateLimiter>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = rate_limit_key(&request);

    if limiter.check_key(&key).is_err() {
        debug!(key = %key, "Rate limit exceeded");
        return Err(ApiError::new(
            ErrorCode::SlowDown,
            "Please reduce your request rate",
        ));
    }

    Ok(next.run(request).await)
}

/// Bucket a request is counted against: the authenticated subject, or the
/// peer address for callers on open paths
pub fn rate_limit_key(request: &Request<Body>) -> String {
    match request.extensions().get::<Principal>() {
        Some(principal) if !principal.is_anonymous() => format!("user:{}", principal.subject),
        _ => match request.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => format!("peer:{}", addr.ip()),
            None => "anonymous".to_string(),
        },
    }
}

/// Request ID middleware - adds the x-request-id header
pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Request ID extension
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Logging middleware
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        duration_ms = %duration.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_rate_limiter() {
        let limiter = create_rate_limiter(1).unwrap();

        assert!(limiter.check_key(&"user1".to_string()).is_ok());
        assert!(limiter.check_key(&"user1".to_string()).is_err());
        // Keys are limited independently
        assert!(limiter.check_key(&"user2".to_string()).is_ok());
    }

    fn request_from(peer: &str, principal: Principal) -> Request<Body> {
        let mut request = Request::get("/docs/retrieve/files/a.txt")
            .body(Body::empty())
            .unwrap();
        let addr: SocketAddr = peer.parse().unwrap();
        request.extensions_mut().insert(ConnectInfo(addr));
        request.extensions_mut().insert(principal);
        request
    }

    #[test]
    fn test_rate_limit_key() {
        let anonymous = request_from("10.0.0.1:4000", Principal::anonymous());
        assert_eq!(rate_limit_key(&anonymous), "peer:10.0.0.1");

        let same_host = request_from("10.0.0.1:5000", Principal::anonymous());
        assert_eq!(rate_limit_key(&same_host), "peer:10.0.0.1");

        let user = request_from("10.0.0.1:4000", Principal::development());
        assert_eq!(rate_limit_key(&user), "user:dev-user");

        let mut bare = Request::get("/health").body(Body::empty()).unwrap();
        bare.extensions_mut().insert(Principal::anonymous());
        assert_eq!(rate_limit_key(&bare), "anonymous");
    }

    #[test]
    fn test_zero_rps_disables_limiter() {
        assert!(create_rate_limiter(0).is_none());
    }
}
