use axum::{extract::State, http::StatusCode, Json};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::{
    dto::{CreateUserRequest, TokenRequest, TokenResponse, UpdateProfileRequest, UserResponse},
    extractors::AuthUser,
    password::{hash_password, meets_length_policy, verify_password},
    repo::{is_unique_violation, User},
    token::AuthToken,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(mut payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("invalid email".into()));
    }
    if !meets_length_policy(&payload.password) {
        warn!("password too short");
        return Err(ApiError::Validation("password too short".into()));
    }

    let hash = hash_password(&payload.password)?;

    // The unique constraint on email decides races, not a lookup here.
    let user = match User::create(&state.db, &payload.email, &payload.name, &hash).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %payload.email, "email already registered");
            return Err(ApiError::Validation("email already registered".into()));
        }
        Err(e) => return Err(e.into()),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn issue_token(
    State(state): State<AppState>,
    Json(mut payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.password.is_empty() {
        warn!(email = %payload.email, "blank password");
        return Err(ApiError::InvalidCredentials);
    }

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %payload.email, "token request for unknown email");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if !user.is_active {
        warn!(user_id = %user.id, "token request for inactive user");
        return Err(ApiError::InvalidCredentials);
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = AuthToken::issue(&state.db, user.id).await?;
    info!(user_id = %user.id, "token issued");
    Ok(Json(TokenResponse { token: token.token }))
}

#[instrument(skip(user))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state, user, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    if let Some(plain) = payload.password.as_deref() {
        if !meets_length_policy(plain) {
            warn!(user_id = %user.id, "password too short");
            return Err(ApiError::Validation("password too short".into()));
        }
    }

    let hash = payload
        .password
        .as_deref()
        .map(hash_password)
        .transpose()?;

    let updated = User::update_profile(
        &state.db,
        user.id,
        payload.name.as_deref(),
        hash.as_deref(),
    )
    .await?;

    info!(user_id = %updated.id, "profile updated");
    Ok(Json(updated.into()))
}
