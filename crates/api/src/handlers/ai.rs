//! Handlers for the `/ai` resource: story generation and image jobs.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use writetalent_core::storyboard::StoryScene;
use writetalent_core::types::Timestamp;
use writetalent_pipeline::{EngineMode, GenerationJob, JobKind, JobStatus, SceneInput};

use crate::error::{AppError, AppResult};
use crate::handlers::jobs::{acknowledge_callback, fetch_job};
use crate::response::{CallbackAck, DataResponse};
use crate::state::AppState;

/// Request body for `POST /ai/generate-story`.
#[derive(Debug, Deserialize)]
pub struct GenerateStoryRequest {
    pub idea: Option<String>,
    pub theme: Option<String>,
    /// Prefer the workflow engine for illustrations when it is configured.
    #[serde(default = "default_use_delegated", alias = "useN8n")]
    pub use_delegated: bool,
}

fn default_use_delegated() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct StoryMetadata {
    pub theme: String,
    /// Length of the story in characters.
    pub word_count: usize,
    pub scene_count: usize,
    pub generated_at: Timestamp,
    pub ai_provider: &'static str,
    pub image_generator: &'static str,
}

#[derive(Debug, Serialize)]
pub struct GenerateStoryResponse {
    pub story: String,
    pub scenes: Vec<StoryScene>,
    pub image_job_id: String,
    pub image_job_status: JobStatus,
    pub originality_score: i32,
    pub metadata: StoryMetadata,
}

fn image_generator(engine: EngineMode) -> &'static str {
    match engine {
        EngineMode::Direct => "comfyui",
        EngineMode::Delegated => "n8n",
    }
}

/// POST /api/v1/ai/generate-story
///
/// Writes the story, starts illustrating its scenes in the background and
/// scores its originality. The response carries the image job id to poll.
pub async fn generate_story(
    State(state): State<AppState>,
    Json(input): Json<GenerateStoryRequest>,
) -> AppResult<Json<DataResponse<GenerateStoryResponse>>> {
    let idea = input.idea.filter(|s| !s.trim().is_empty());
    let theme = input.theme.filter(|s| !s.trim().is_empty());
    let (Some(idea), Some(theme)) = (idea, theme) else {
        return Err(AppError::BadRequest(
            "Missing required fields: idea and theme".into(),
        ));
    };

    tracing::info!(theme = %theme, idea_chars = idea.chars().count(), "Generating story");

    let storyboard = state
        .storyteller
        .generate_storyboard(&theme, &idea)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    if storyboard.scenes.is_empty() {
        return Err(AppError::InternalError(
            "Story generation produced no scenes".into(),
        ));
    }

    let inputs: Vec<SceneInput> = storyboard
        .scenes
        .iter()
        .cloned()
        .map(SceneInput::from)
        .collect();
    let job = state
        .dispatcher
        .create_job(JobKind::ImageSet, inputs, input.use_delegated)
        .await?;

    let originality_score = state
        .storyteller
        .score_originality(&idea, &storyboard.story)
        .await;

    tracing::info!(job_id = %job.id, originality_score, "Story generated");

    let metadata = StoryMetadata {
        theme,
        word_count: storyboard.story.chars().count(),
        scene_count: storyboard.scenes.len(),
        generated_at: Utc::now(),
        ai_provider: state.storyteller.provider(),
        image_generator: image_generator(job.engine),
    };

    Ok(Json(DataResponse {
        data: GenerateStoryResponse {
            story: storyboard.story,
            scenes: storyboard.scenes,
            image_job_id: job.id,
            image_job_status: job.status,
            originality_score,
            metadata,
        },
    }))
}

/// GET /api/v1/ai/image-jobs/{id}
pub async fn get_image_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DataResponse<GenerationJob>>> {
    let job = fetch_job(&state, &id, JobKind::ImageSet).await?;
    Ok(Json(DataResponse { data: job }))
}

/// POST /api/v1/ai/image-callback/{id}
///
/// Always answers 200 so the workflow engine does not retry.
pub async fn image_callback(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Json<CallbackAck> {
    Json(acknowledge_callback(&state, &id, JobKind::ImageSet, &body).await)
}
