//! Callback bodies POSTed back by the workflows.
//!
//! The image workflow reports `{status, task_id, images, stats, error}`;
//! the video workflow reports `{status, videoUrl, error}`. Both are read
//! through one lenient struct where every field is optional.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackPayload {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<CallbackImage>>,
    #[serde(default, rename = "videoUrl", alias = "video_url")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub stats: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Per-scene result inside an image callback.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackImage {
    #[serde(default)]
    pub scene_id: Option<i64>,
    #[serde(default)]
    pub scene_index: Option<usize>,
    #[serde(default, rename = "imageUrl", alias = "image_url")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl CallbackPayload {
    /// `true` when the workflow reported a batch-level failure.
    pub fn is_failure(&self) -> bool {
        self.error.as_deref().is_some_and(|e| !e.trim().is_empty())
            || self.status.as_deref() == Some("failed")
    }

    pub fn has_results(&self) -> bool {
        self.images.as_ref().is_some_and(|images| !images.is_empty())
            || self.final_video_url().is_some()
    }

    /// The reported video location, ignoring blank values.
    pub fn final_video_url(&self) -> Option<&str> {
        self.video_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}
