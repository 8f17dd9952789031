//! Bearer-token authentication
//!
//! Requests must carry `Authorization: Bearer <jwt>`, signed with HS256 and
//! the shared secret. The token's `exp` claim is required and checked.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::handlers::ApiError;

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    /// Expiry as a unix timestamp in seconds
    pub exp: i64,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing authorization header")]
    MissingToken,

    #[error("Expected 'Bearer <token>' authorization")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
}

/// Verifies HS256 tokens against the shared secret
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
    validation: Arc<Validation>,
}

impl TokenVerifier {
    /// Create a verifier for HS256 tokens signed with `secret`
    ///
    /// Expiry is checked without leeway.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
        }
    }

    /// Check the signature and expiry of `token` and return its claims
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for malformed, forged or expired tokens
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Sign a token for `username` valid for `ttl`
pub fn issue_token(secret: &str, username: &str, ttl: Duration) -> Result<String, AuthError> {
    let claims = Claims {
        username: username.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

fn bearer_token(request: &Request) -> Result<&str, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader)?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

/// Reject requests without a valid bearer token
///
/// On success the decoded `Claims` are added to the request extensions.
pub async fn require_bearer(
    State(verifier): State<TokenVerifier>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = bearer_token(&request)
        .and_then(|token| verifier.verify(token))
        .map_err(|err| {
            warn!(path = %request.uri().path(), error = %err, "Rejected unauthenticated request");
            ApiError::unauthorized(err.to_string())
        })?;

    debug!(username = %claims.username, "Request authenticated");
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issued_token_verifies() {
        let token = issue_token(SECRET, "testuser", Duration::hours(1)).unwrap();
        let claims = TokenVerifier::new(SECRET).verify(&token).unwrap();

        assert_eq!(claims.username, "testuser");
        assert!(claims.exp > Utc::now().timestamp());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_token("other-secret", "testuser", Duration::hours(1)).unwrap();
        let result = TokenVerifier::new(SECRET).verify(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let token = issue_token(SECRET, "testuser", Duration::hours(-1)).unwrap();
        let result = TokenVerifier::new(SECRET).verify(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let result = TokenVerifier::new(SECRET).verify("not-a-jwt");
        assert!(matches!(result, Err(AuthError::InvalidToken(_))));
    }
}
