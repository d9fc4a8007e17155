use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub mod password;
pub mod repo;
pub mod token;

/// Registration and token issuance are public; the profile route is
/// GET/PATCH only, so axum rejects POST with 405 before any extractor runs.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(handlers::create_user))
        .route("/users/token", post(handlers::issue_token))
        .route(
            "/users/me",
            get(handlers::get_me).patch(handlers::update_me),
        )
}
