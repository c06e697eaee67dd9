//! Caller identity: Clerk session tokens on the API, signed deliveries on the webhook.

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use clerk_rs::clerk::Clerk;
use clerk_rs::validators::authorizer::validate_jwt;
use clerk_rs::validators::jwks::MemoryCacheJwksProvider;
use clerk_rs::ClerkConfiguration;
use tracing::warn;

use crate::errors::AppError;
use crate::state::AppState;

/// Resolves a bearer credential to the caller's Clerk user id.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AppError>;
}

/// Validates Clerk session JWTs against the instance JWKS.
/// The provider caches the public keys, so one verifier is built at startup and shared.
pub struct ClerkVerifier {
    jwks: Arc<MemoryCacheJwksProvider>,
}

impl ClerkVerifier {
    pub fn new(secret_key: &str) -> Self {
        let config = ClerkConfiguration::new(None, None, Some(secret_key.to_string()), None);
        let clerk = Clerk::new(config);
        Self {
            jwks: Arc::new(MemoryCacheJwksProvider::new(clerk)),
        }
    }
}

#[async_trait]
impl IdentityVerifier for ClerkVerifier {
    async fn verify(&self, token: &str) -> Result<String, AppError> {
        let jwt = validate_jwt(token, self.jwks.clone()).await.map_err(|e| {
            warn!("Rejected session token: {e}");
            AppError::Unauthorized("Invalid or expired session token".to_string())
        })?;
        Ok(jwt.sub)
    }
}

/// Extractor for routes that require a signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub clerk_id: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

        let clerk_id = state.identity.verify(token).await?;
        Ok(AuthUser { clerk_id })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcg=="), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
