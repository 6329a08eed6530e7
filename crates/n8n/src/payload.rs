//! Webhook request bodies.
//!
//! Field names follow what the n8n workflows read, which is why image
//! scenes mix `imagePrompt` with `scene_index`.

use serde::Serialize;

/// Webhook path of the parallel story-image workflow.
pub const IMAGE_BATCH_WEBHOOK: &str = "story_images_parallel";

/// Webhook path of the scenes-to-video workflow.
pub const VIDEO_BATCH_WEBHOOK: &str = "story_final_v2";

/// Default segment length when a scene does not specify one.
pub const DEFAULT_SEGMENT_SECONDS: u32 = 6;

#[derive(Debug, Clone, Serialize)]
pub struct ImageBatchScene {
    pub id: i64,
    #[serde(rename = "imagePrompt")]
    pub image_prompt: String,
    pub scene_index: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageBatchPayload {
    pub scenes: Vec<ImageBatchScene>,
    pub task_id: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoBatchScene {
    pub scene_id: i64,
    pub duration: u32,
    pub audio_script: String,
    pub subtitle: String,
    pub video_prompt: String,
    pub story: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoBatchPayload {
    pub scenes: Vec<VideoBatchScene>,
    /// All scene stories joined with spaces.
    pub original_story: String,
    pub task_id: String,
    pub callback_url: String,
}
