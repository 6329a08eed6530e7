//! Route definitions for the `/auth` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /register                -> register
/// POST /send-verification-code  -> send_verification_code
/// POST /reset-password          -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/send-verification-code", post(auth::send_verification_code))
        .route("/reset-password", post(auth::reset_password))
}
