use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};

use crate::auth::{AuthError, AuthProvider};
use crate::domain::UserId;
use crate::error::{ServiceError, with_path};

/// Extracts and resolves the bearer token on every authenticated route.
/// `/healthz` is the only handler that skips this extractor.
pub struct AuthenticatedUser(pub UserId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn AuthProvider>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = crate::error::ErrorResponse;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let provider = Arc::<dyn AuthProvider>::from_ref(state);

        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| with_path(ServiceError::Unauthenticated, &parts.uri))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| with_path(ServiceError::Unauthenticated, &parts.uri))?;

        match provider.resolve(token).await {
            Ok(user_id) => Ok(AuthenticatedUser(user_id)),
            Err(AuthError::Unauthenticated) => Err(with_path(ServiceError::Unauthenticated, &parts.uri)),
            Err(AuthError::ProviderUnavailable(msg)) => {
                Err(with_path(ServiceError::Internal(msg), &parts.uri))
            }
        }
    }
}
