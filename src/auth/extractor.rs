use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{claims::JwtKeys, repo::Identity};
use crate::{error::ApiError, state::AppState};

/// Authentication gate: extracts the token from the `Authorization` header,
/// verifies it and resolves the subject to an existing user. Routes taking
/// this extractor see a fully resolved identity or the request is rejected
/// before business logic runs.
pub struct AuthUser(pub Identity);

/// The header may carry `Bearer <token>` or a bare token.
pub(crate) fn extract_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthenticated("No token provided".into()))?;

        let token = extract_token(header)
            .ok_or_else(|| ApiError::Unauthenticated("No token provided".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthenticated("Invalid or expired token".into())
        })?;

        let identity = Identity::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(|| {
                warn!(user_id = %claims.sub, "token subject no longer exists");
                ApiError::Unauthenticated("User not found".into())
            })?;

        Ok(AuthUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_bearer_token() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn extracts_bare_token() {
        assert_eq!(extract_token("abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_empty_values() {
        assert_eq!(extract_token(""), None);
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("   "), None);
    }
}
