use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, error, info};

use super::token_blacklist;
use super::Claims;
use crate::config::AuthConfig;
use crate::entities::Role;

/// Security errors for token and password operations
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Invalid token issuer")]
    InvalidIssuer,

    #[error("Token has been revoked")]
    TokenRevoked,

    #[error("Token generation failed: {0}")]
    TokenGeneration(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

/// Issue a signed token for a user
pub fn generate_token(config: &AuthConfig, user_id: &str, role: Role) -> Result<String, SecurityError> {
    let now = Utc::now().timestamp();
    let issued_at = token_blacklist::blacklist().next_issue_time(user_id, now);
    let expiration = issued_at + Duration::days(config.token_ttl_days).num_seconds();

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        iss: config.issuer.clone(),
        iat: issued_at,
        exp: expiration,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenGeneration(e.to_string())
    })?;

    info!("Generated token for user {}", user_id);
    debug!("Token expiration: {}", expiration);

    Ok(token)
}

/// Validate signature, issuer, expiry and revocation
pub fn validate_token(config: &AuthConfig, token: &str) -> Result<Claims, SecurityError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.set_issuer(&[config.issuer.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => SecurityError::InvalidIssuer,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            SecurityError::TokenValidation("Invalid signature".to_string())
        }
        _ => SecurityError::TokenValidation(e.to_string()),
    })?;

    let claims = token_data.claims;
    if token_blacklist::blacklist().is_revoked(&claims.sub, claims.iat) {
        debug!("Token for user {} was issued before logout", claims.sub);
        return Err(SecurityError::TokenRevoked);
    }

    Ok(claims)
}

/// Revoke every token the user currently holds
pub fn revoke_tokens(config: &AuthConfig, user_id: &str) {
    let now = Utc::now().timestamp();
    let expires_at = now + Duration::days(config.token_ttl_days).num_seconds();
    let blacklist = token_blacklist::blacklist();
    blacklist.cleanup_expired(now);
    blacklist.revoke_user(user_id, now, expires_at);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test_secret_key_for_testing_only".to_string(),
            issuer: "test-issuer".to_string(),
            token_ttl_days: 30,
        }
    }

    fn user_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    #[test]
    fn test_generate_and_validate_token() {
        let id = user_id();
        let token = generate_token(&config(), &id, Role::Provider).unwrap();
        assert!(!token.is_empty());

        let claims = validate_token(&config(), &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, "provider");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.exp - claims.iat, 30 * 86_400);
    }

    #[test]
    fn test_token_expiration() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id(),
            role: "patient".to_string(),
            iss: "test-issuer".to_string(),
            iat: now - 7_200,
            exp: now - 3_600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config().jwt_secret.as_bytes()),
        )
        .unwrap();

        match validate_token(&config(), &token) {
            Err(SecurityError::TokenExpired) => {}
            other => panic!("Expected TokenExpired error but got: {:?}", other),
        }
    }

    #[test]
    fn test_wrong_issuer_and_secret() {
        let token = generate_token(&config(), &user_id(), Role::Patient).unwrap();

        let mut other_issuer = config();
        other_issuer.issuer = "someone-else".to_string();
        assert!(matches!(validate_token(&other_issuer, &token), Err(SecurityError::InvalidIssuer)));

        let mut other_secret = config();
        other_secret.jwt_secret = "different".to_string();
        assert!(validate_token(&other_secret, &token).is_err());
    }

    #[test]
    fn test_invalid_token() {
        match validate_token(&config(), "invalid.token.format") {
            Err(SecurityError::InvalidToken) | Err(SecurityError::TokenValidation(_)) => {}
            other => panic!("Expected InvalidToken or TokenValidation error, got {:?}", other),
        }
    }

    #[test]
    fn test_revoked_tokens_fail_and_new_tokens_work() {
        let id = user_id();
        let old = generate_token(&config(), &id, Role::Patient).unwrap();

        revoke_tokens(&config(), &id);
        assert!(matches!(validate_token(&config(), &old), Err(SecurityError::TokenRevoked)));

        let fresh = generate_token(&config(), &id, Role::Patient).unwrap();
        assert!(validate_token(&config(), &fresh).is_ok());
    }

    #[test]
    fn test_revoking_prunes_expired_revocations() {
        let stale = user_id();
        let now = Utc::now().timestamp();
        token_blacklist::blacklist().revoke_user(&stale, now - 100, now - 10);

        revoke_tokens(&config(), &user_id());
        assert!(!token_blacklist::blacklist().is_revoked(&stale, now - 200));
    }
}
