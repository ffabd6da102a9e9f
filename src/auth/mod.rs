use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing or invalid bearer token")]
    Unauthenticated,
    #[error("auth provider request failed: {0}")]
    ProviderUnavailable(String),
}

/// Resolves a bearer token to a `userId`. Token issuance/validation itself
/// lives outside this service; it only trusts whatever
/// `userId` comes back.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn resolve(&self, bearer_token: &str) -> Result<UserId, AuthError>;
}

#[derive(Deserialize)]
struct ResolveResponse {
    user_id: UserId,
}

/// Calls the configured external credential-exchange endpoint over
/// `reqwest`, authenticating itself with `auth_provider_appid`/`_secret`.
pub struct ReqwestAuthProvider {
    client: reqwest::Client,
    endpoint: String,
    app_id: String,
    app_secret: String,
}

impl ReqwestAuthProvider {
    pub fn new(endpoint: String, app_id: String, app_secret: String) -> Self {
        Self { client: reqwest::Client::new(), endpoint, app_id, app_secret }
    }
}

#[async_trait]
impl AuthProvider for ReqwestAuthProvider {
    async fn resolve(&self, bearer_token: &str) -> Result<UserId, AuthError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(bearer_token)
            .header("X-App-Id", &self.app_id)
            .header("X-App-Secret", &self.app_secret)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Unauthenticated);
        }

        let parsed: ResolveResponse = response
            .json()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        Ok(parsed.user_id)
    }
}

/// Resolves any non-empty token to itself, minus a `test-` prefix if
/// present. Used by integration tests in place of a live credential
/// exchange.
#[derive(Default)]
pub struct DeterministicAuthProvider;

#[async_trait]
impl AuthProvider for DeterministicAuthProvider {
    async fn resolve(&self, bearer_token: &str) -> Result<UserId, AuthError> {
        if bearer_token.is_empty() {
            return Err(AuthError::Unauthenticated);
        }
        Ok(bearer_token.trim_start_matches("test-").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deterministic_provider_rejects_empty_token() {
        let provider = DeterministicAuthProvider;
        let err = provider.resolve("").await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn deterministic_provider_strips_prefix() {
        let provider = DeterministicAuthProvider;
        let user_id = provider.resolve("test-alice").await.unwrap();
        assert_eq!(user_id, "alice");
    }
}
