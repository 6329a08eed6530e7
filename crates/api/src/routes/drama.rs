//! Route definitions for the `/drama` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::drama;
use crate::state::AppState;

/// Routes mounted at `/drama`.
///
/// ```text
/// POST /generate-video  -> generate_video
/// GET  /tasks/{id}      -> get_video_task
/// POST /callback/{id}   -> video_callback (workflow engine)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-video", post(drama::generate_video))
        .route("/tasks/{id}", get(drama::get_video_task))
        .route("/callback/{id}", post(drama::video_callback))
}
