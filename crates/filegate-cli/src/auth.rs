//! Authentication: bearer token verification and role extraction

use crate::config::GatewayConfig;
use crate::error::{ApiError, ErrorCode};
use crate::state::Principal;
use chrono::DateTime;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Role required for uploads and removals
pub const ADMIN_ROLE: &str = "ADMIN";

/// Roles held by a caller
pub type RoleSet = BTreeSet<String>;

/// JWT claims structure (Keycloak-style access token)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    #[serde(default)]
    pub sub: String,
    /// Expiration time
    pub exp: i64,
    /// Issued at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Authorized party
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_username: Option<String>,
    /// Per-client role grants: `{"<client>": {"roles": [...]}}`.
    /// Kept untyped so a malformed shape degrades to "no roles".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_access: Option<Value>,
}

/// Verifies bearer tokens against a configured key
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Shared-secret (HS256) tokens
    pub fn hs256(secret: &str) -> Self {
        Self::with_key(DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)
    }

    /// RSA-signed (RS256) tokens, public key in PEM form
    pub fn rs256_pem(pem: &[u8]) -> Result<Self, jsonwebtoken::errors::Error> {
        Ok(Self::with_key(DecodingKey::from_rsa_pem(pem)?, Algorithm::RS256))
    }

    fn with_key(key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;
        Self { key, validation }
    }

    /// Require the `iss` claim to match
    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.validation.set_issuer(&[issuer]);
        self
    }

    /// Require the `aud` claim to contain `audience`
    pub fn with_audience(mut self, audience: &str) -> Self {
        self.validation.set_audience(&[audience]);
        self.validation.validate_aud = true;
        self
    }

    /// Build the verifier described by the configuration, if any key is set
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Option<Self>> {
        let verifier = match (&config.jwt_public_key_path, &config.jwt_secret) {
            (Some(path), _) => {
                let pem = std::fs::read(path).map_err(|e| {
                    anyhow::anyhow!("failed to read JWT public key {}: {}", path.display(), e)
                })?;
                Self::rs256_pem(&pem)?
            }
            (None, Some(secret)) => Self::hs256(secret),
            (None, None) => return Ok(None),
        };

        let verifier = match config.jwt_issuer {
            Some(ref issuer) => verifier.with_issuer(issuer),
            None => verifier,
        };
        let verifier = match config.jwt_audience {
            Some(ref audience) => verifier.with_audience(audience),
            None => verifier,
        };

        Ok(Some(verifier))
    }

    /// Validate a token and extract its claims
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!("Token validation failed: {}", e);
                ApiError::new(ErrorCode::Unauthorized, "Invalid or expired token")
            })
    }
}

/// Extract the roles granted to `client_id` from `resource_access`.
///
/// Total over malformed input: anything that is not
/// `{client_id: {"roles": [string, ...]}}` yields no roles and is logged.
pub fn extract_roles(claims: &Claims, client_id: &str) -> RoleSet {
    let Some(resource_access) = claims.resource_access.as_ref() else {
        return RoleSet::new();
    };
    let Some(clients) = resource_access.as_object() else {
        warn!(subject = %claims.sub, "resource_access claim is not an object");
        return RoleSet::new();
    };
    let Some(client) = clients.get(client_id) else {
        debug!(subject = %claims.sub, client_id, "No roles granted for client");
        return RoleSet::new();
    };

    let roles: RoleSet = match client.get("roles") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(|entry| match entry.as_str() {
                Some(role) => Some(role.to_string()),
                None => {
                    warn!(subject = %claims.sub, client_id, "Ignoring non-string role entry");
                    None
                }
            })
            .collect(),
        Some(_) => {
            warn!(subject = %claims.sub, client_id, "Client roles claim is not a list");
            RoleSet::new()
        }
        None if client.is_object() => RoleSet::new(),
        None => {
            warn!(subject = %claims.sub, client_id, "Client entry in resource_access is not an object");
            RoleSet::new()
        }
    };

    info!(subject = %claims.sub, client_id, roles = ?roles, "Client roles");
    roles
}

/// Convert verified claims to a principal
pub fn claims_to_principal(claims: &Claims, client_id: &str) -> Principal {
    Principal {
        subject: claims.sub.clone(),
        display_name: claims.preferred_username.clone(),
        roles: extract_roles(claims, client_id),
        expires_at: DateTime::from_timestamp(claims.exp, 0),
    }
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn claims_with(resource_access: Option<Value>) -> Claims {
        Claims {
            sub: "user123".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
            iat: Some(Utc::now().timestamp()),
            iss: None,
            azp: None,
            preferred_username: Some("alice".to_string()),
            resource_access,
        }
    }

    fn create_test_token(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_verify_token() {
        let claims = claims_with(Some(json!({"files": {"roles": ["ADMIN"]}})));
        let token = create_test_token(&claims, "test-secret");

        let verified = TokenVerifier::hs256("test-secret").verify(&token).unwrap();

        assert_eq!(verified.sub, "user123");
        assert_eq!(extract_roles(&verified, "files"), RoleSet::from([ADMIN_ROLE.to_string()]));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_test_token(&claims_with(None), "test-secret");
        let result = TokenVerifier::hs256("other-secret").verify(&token);
        assert!(matches!(
            result,
            Err(ApiError::Api { code: ErrorCode::Unauthorized, .. })
        ));
    }

    #[test]
    fn test_expired_token() {
        let mut claims = claims_with(None);
        claims.exp = (Utc::now() - Duration::hours(1)).timestamp();
        let token = create_test_token(&claims, "test-secret");

        assert!(TokenVerifier::hs256("test-secret").verify(&token).is_err());
    }

    #[test]
    fn test_issuer_is_enforced() {
        let mut claims = claims_with(None);
        claims.iss = Some("https://sso.example.com/realms/other".to_string());
        let token = create_test_token(&claims, "s");

        let verifier =
            TokenVerifier::hs256("s").with_issuer("https://sso.example.com/realms/files");
        assert!(verifier.verify(&token).is_err());

        claims.iss = Some("https://sso.example.com/realms/files".to_string());
        let token = create_test_token(&claims, "s");
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_roles_missing_claim() {
        assert!(extract_roles(&claims_with(None), "files").is_empty());
    }

    #[test]
    fn test_roles_other_client_only() {
        let claims = claims_with(Some(json!({"account": {"roles": ["ADMIN"]}})));
        assert!(extract_roles(&claims, "files").is_empty());
    }

    #[test]
    fn test_roles_malformed_shapes() {
        let not_object = claims_with(Some(json!(["files"])));
        assert!(extract_roles(&not_object, "files").is_empty());

        let roles_not_list = claims_with(Some(json!({"files": {"roles": "ADMIN"}})));
        assert!(extract_roles(&roles_not_list, "files").is_empty());

        let client_not_object = claims_with(Some(json!({"files": "ADMIN"})));
        assert!(extract_roles(&client_not_object, "files").is_empty());

        let mixed = claims_with(Some(json!({"files": {"roles": ["ADMIN", 7, null, "viewer"]}})));
        assert_eq!(
            extract_roles(&mixed, "files"),
            RoleSet::from(["ADMIN".to_string(), "viewer".to_string()])
        );
    }

    #[test]
    fn test_claims_to_principal() {
        let claims = claims_with(Some(json!({"files": {"roles": ["ADMIN"]}})));
        let principal = claims_to_principal(&claims, "files");

        assert_eq!(principal.subject, "user123");
        assert_eq!(principal.display_name.as_deref(), Some("alice"));
        assert!(principal.is_admin());
        assert!(!principal.is_expired());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Basic xyz"), None);
    }

    #[test]
    fn test_from_config() {
        let config = GatewayConfig::default();
        assert!(TokenVerifier::from_config(&config).unwrap().is_none());

        let config = GatewayConfig {
            jwt_secret: Some("s".to_string()),
            ..Default::default()
        };
        assert!(TokenVerifier::from_config(&config).unwrap().is_some());

        let config = GatewayConfig {
            jwt_public_key_path: Some("/nonexistent/key.pem".into()),
            ..Default::default()
        };
        assert!(TokenVerifier::from_config(&config).is_err());
    }
}
