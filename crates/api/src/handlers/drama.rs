//! Handlers for the `/drama` resource: scene-to-video jobs.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use writetalent_pipeline::{GenerationJob, JobKind, SceneInput};

use crate::error::{AppError, AppResult};
use crate::handlers::jobs::{acknowledge_callback, fetch_job};
use crate::response::{CallbackAck, DataResponse};
use crate::state::AppState;

/// One storyboard scene as sent by the video step of the wizard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSceneRequest {
    pub id: Option<i64>,
    pub story: Option<String>,
    pub image_prompt: Option<String>,
    pub voice_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl From<VideoSceneRequest> for SceneInput {
    fn from(scene: VideoSceneRequest) -> Self {
        Self {
            scene_id: scene.id,
            prompt: scene.image_prompt.unwrap_or_default(),
            detailed_prompt: None,
            story: scene.story,
            voice_prompt: scene.voice_prompt,
            video_prompt: scene.video_prompt,
            duration_seconds: scene.duration_seconds,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoRequest {
    pub scenes: Option<Vec<VideoSceneRequest>>,
}

/// POST /api/v1/drama/generate-video
///
/// Hands the scenes to the workflow engine. Answers 202 with the initial
/// snapshot; poll `/drama/tasks/{id}` for the final video.
pub async fn generate_video(
    State(state): State<AppState>,
    Json(input): Json<GenerateVideoRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<GenerationJob>>)> {
    let scenes = input
        .scenes
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("A non-empty scenes array is required".into()))?;

    let inputs: Vec<SceneInput> = scenes.into_iter().map(SceneInput::from).collect();
    let job = state
        .dispatcher
        .create_job(JobKind::Video, inputs, true)
        .await?;

    Ok((StatusCode::ACCEPTED, Json(DataResponse { data: job })))
}

/// GET /api/v1/drama/tasks/{id}
pub async fn get_video_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<GenerationJob>>> {
    let job = fetch_job(&state, &id, JobKind::Video).await?;
    Ok(Json(DataResponse { data: job }))
}

/// POST /api/v1/drama/callback/{id}
///
/// Always answers 200 so the workflow engine does not retry.
pub async fn video_callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Json<CallbackAck> {
    Json(acknowledge_callback(&state, &id, JobKind::Video, &body).await)
}
