use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{repo::User, token::AuthToken};

/// Resolves the bearer token to the calling identity. Rejection happens
/// before any handler runs, so protected handlers never see an
/// unauthenticated request.
pub struct AuthUser(pub User);

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
            .ok_or(ApiError::Unauthorized)?;

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::Unauthorized)?;

        let user = match AuthToken::resolve(&state.db, token).await? {
            Some(user) => user,
            None => {
                warn!("unknown bearer token");
                return Err(ApiError::Unauthorized);
            }
        };

        if !user.is_active {
            warn!(user_id = %user.id, "token for inactive user");
            return Err(ApiError::Unauthorized);
        }

        Ok(AuthUser(user))
    }
}
