//! Route definitions for the `/ai` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::ai;
use crate::state::AppState;

/// Routes mounted at `/ai`.
///
/// ```text
/// POST /generate-story       -> generate_story
/// GET  /image-jobs/{id}      -> get_image_job
/// POST /image-callback/{id}  -> image_callback (workflow engine)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-story", post(ai::generate_story))
        .route("/image-jobs/{id}", get(ai::get_image_job))
        .route("/image-callback/{id}", post(ai::image_callback))
}
