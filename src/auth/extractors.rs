use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::jwt::{Claims, JwtKeys};
use crate::{error::ApiError, state::AppState};

/// Extracts and validates the bearer access token, rejecting revoked ones
/// and tokens whose user has been deleted.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

impl AuthUser {
    pub fn ensure_is(&self, owner: Uuid) -> Result<(), ApiError> {
        if self.user_id != owner {
            warn!(caller = %self.user_id, %owner, "ownership check failed");
            return Err(ApiError::Forbidden(
                "Not allowed to modify another user's data".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify_access(token.trim()).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        if state.revoked.is_revoked(claims.jti).await? {
            warn!(user_id = %claims.sub, jti = %claims.jti, "revoked token presented");
            return Err(ApiError::Unauthorized("Token has been revoked".into()));
        }
        if state.users.find_by_id(claims.sub).await?.is_none() {
            warn!(user_id = %claims.sub, "token subject no longer exists");
            return Err(ApiError::Unauthorized("User no longer exists".into()));
        }

        Ok(AuthUser {
            user_id: claims.sub,
            claims,
        })
    }
}
