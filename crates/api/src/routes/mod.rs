pub mod ai;
pub mod auth;
pub mod drama;
pub mod health;
pub mod portfolios;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth
///     POST /register                      register
///     POST /send-verification-code        send_verification_code
///     POST /reset-password                reset_password
///
/// /users
///     GET  /{id}                          get_by_id
///
/// /portfolios
///     GET  /                              list
///     POST /                              create
///     GET  /{id}                          get_by_id
///
/// /ai
///     POST /generate-story                generate_story
///     GET  /image-jobs/{id}               get_image_job
///     POST /image-callback/{id}           image_callback
///
/// /drama
///     POST /generate-video                generate_video
///     GET  /tasks/{id}                    get_video_task
///     POST /callback/{id}                 video_callback
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/portfolios", portfolios::router())
        .nest("/ai", ai::router())
        .nest("/drama", drama::router())
}
