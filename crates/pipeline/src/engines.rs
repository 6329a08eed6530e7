//! Engine adapters over the ComfyUI and n8n clients.

use async_trait::async_trait;
use writetalent_comfyui::api::{ComfyUIApi, ComfyUIApiError};
use writetalent_comfyui::config::ComfyUIConfig;
use writetalent_comfyui::history::find_first_image;
use writetalent_comfyui::workflow::{WorkflowError, WorkflowParams, WorkflowTemplate};
use writetalent_n8n::payload::DEFAULT_SEGMENT_SECONDS;
use writetalent_n8n::{
    ImageBatchPayload, ImageBatchScene, N8nClient, N8nError, VideoBatchPayload, VideoBatchScene,
};

use crate::engine::{BatchAck, BatchRequest, EngineError, ImageEngine, ImageRequest, WorkflowEngine};
use crate::job::{JobKind, SceneTask};

impl From<ComfyUIApiError> for EngineError {
    fn from(e: ComfyUIApiError) -> Self {
        match e {
            ComfyUIApiError::Request(e) => Self::Request(e.to_string()),
            ComfyUIApiError::Rejected { status, body } => Self::Rejected { status, body },
            ComfyUIApiError::InvalidUrl(msg) => Self::Invalid(msg),
        }
    }
}

impl From<N8nError> for EngineError {
    fn from(e: N8nError) -> Self {
        match e {
            N8nError::Request(e) => Self::Request(e.to_string()),
            N8nError::ApiError { status, body } => Self::Rejected { status, body },
        }
    }
}

impl From<WorkflowError> for EngineError {
    fn from(e: WorkflowError) -> Self {
        Self::Invalid(e.to_string())
    }
}

/// ComfyUI running the Flux text-to-image workflow.
pub struct ComfyImageEngine {
    api: ComfyUIApi,
    template: WorkflowTemplate,
}

impl ComfyImageEngine {
    pub fn from_config(config: ComfyUIConfig) -> Result<Self, EngineError> {
        let api = ComfyUIApi::new(config.base_url.clone(), config.request_timeout)?;
        let template = WorkflowTemplate::load(config)?;
        Ok(Self { api, template })
    }
}

#[async_trait]
impl ImageEngine for ComfyImageEngine {
    async fn submit(&self, request: &ImageRequest) -> Result<String, EngineError> {
        let workflow = self.template.render(&WorkflowParams {
            prompt: &request.prompt,
            detailed_prompt: &request.detailed_prompt,
            seed: request.seed,
            filename_prefix: &request.filename_prefix,
        })?;
        let client_id = uuid::Uuid::new_v4().to_string();
        let response = self.api.submit_workflow(&workflow, &client_id).await?;
        Ok(response.prompt_id)
    }

    async fn poll(&self, submission_id: &str) -> Result<Option<String>, EngineError> {
        let history = self.api.get_history(submission_id).await?;
        match find_first_image(&history, submission_id) {
            Some(image) => Ok(Some(self.api.view_url(&image)?)),
            None => Ok(None),
        }
    }
}

/// n8n running the story-image and scenes-to-video workflows.
pub struct N8nWorkflowEngine {
    client: N8nClient,
}

impl N8nWorkflowEngine {
    pub fn new(client: N8nClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WorkflowEngine for N8nWorkflowEngine {
    async fn submit_batch(&self, request: BatchRequest<'_>) -> Result<BatchAck, EngineError> {
        let ack = match request.kind {
            JobKind::ImageSet => {
                self.client
                    .trigger_image_batch(&image_payload(&request))
                    .await?
            }
            JobKind::Video => {
                self.client
                    .trigger_video_batch(&video_payload(&request))
                    .await?
            }
        };
        Ok(BatchAck {
            execution_id: ack.execution_id,
        })
    }
}

fn scene_number(scene: &SceneTask) -> i64 {
    scene.input.scene_id.unwrap_or(scene.index as i64 + 1)
}

fn first_non_empty(candidates: &[Option<&String>]) -> String {
    candidates
        .iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

fn image_payload(request: &BatchRequest<'_>) -> ImageBatchPayload {
    ImageBatchPayload {
        scenes: request
            .scenes
            .iter()
            .map(|scene| ImageBatchScene {
                id: scene_number(scene),
                image_prompt: first_non_empty(&[Some(&scene.input.prompt), scene.input.story.as_ref()]),
                scene_index: scene.index,
            })
            .collect(),
        task_id: request.job_id.to_string(),
        callback_url: request.callback_url.to_string(),
    }
}

fn video_payload(request: &BatchRequest<'_>) -> VideoBatchPayload {
    let scenes: Vec<VideoBatchScene> = request
        .scenes
        .iter()
        .map(|scene| {
            let input = &scene.input;
            VideoBatchScene {
                scene_id: scene_number(scene),
                duration: input.duration_seconds.unwrap_or(DEFAULT_SEGMENT_SECONDS),
                audio_script: first_non_empty(&[input.voice_prompt.as_ref(), input.story.as_ref()]),
                subtitle: first_non_empty(&[input.story.as_ref(), input.voice_prompt.as_ref()]),
                video_prompt: first_non_empty(&[input.video_prompt.as_ref(), Some(&input.prompt)]),
                story: input.story.clone().unwrap_or_default(),
            }
        })
        .collect();

    let original_story = request
        .scenes
        .iter()
        .map(|scene| first_non_empty(&[scene.input.story.as_ref(), scene.input.voice_prompt.as_ref()]))
        .collect::<Vec<_>>()
        .join(" ");

    VideoBatchPayload {
        scenes,
        original_story,
        task_id: request.job_id.to_string(),
        callback_url: request.callback_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::job::{EngineMode, GenerationJob, SceneInput};

    fn scenes(kind: JobKind, inputs: Vec<SceneInput>) -> Vec<SceneTask> {
        GenerationJob::new("job-1".into(), kind, EngineMode::Delegated, inputs, Utc::now())
            .unwrap()
            .scenes
    }

    #[test]
    fn image_payload_numbers_scenes() {
        let scenes = scenes(
            JobKind::ImageSet,
            vec![
                SceneInput::from_prompt("a fox"),
                SceneInput {
                    scene_id: Some(7),
                    story: Some("The owl woke.".into()),
                    ..SceneInput::default()
                },
            ],
        );
        let payload = image_payload(&BatchRequest {
            job_id: "job-1",
            kind: JobKind::ImageSet,
            scenes: &scenes,
            callback_url: "http://cb",
        });
        assert_eq!(payload.scenes[0].id, 1);
        assert_eq!(payload.scenes[1].id, 7);
        assert_eq!(payload.scenes[1].image_prompt, "The owl woke.");
        assert_eq!(payload.scenes[1].scene_index, 1);
        assert_eq!(payload.task_id, "job-1");
    }

    #[test]
    fn video_payload_maps_voice_and_defaults() {
        let scenes = scenes(
            JobKind::Video,
            vec![
                SceneInput {
                    story: Some("Tom sailed.".into()),
                    voice_prompt: Some("Tom sailed away!".into()),
                    duration_seconds: Some(8),
                    ..SceneInput::from_prompt("a boat")
                },
                SceneInput {
                    story: Some("He came home.".into()),
                    ..SceneInput::default()
                },
            ],
        );
        let payload = video_payload(&BatchRequest {
            job_id: "job-1",
            kind: JobKind::Video,
            scenes: &scenes,
            callback_url: "http://cb",
        });

        let first = &payload.scenes[0];
        assert_eq!(first.audio_script, "Tom sailed away!");
        assert_eq!(first.subtitle, "Tom sailed.");
        assert_eq!(first.video_prompt, "a boat");
        assert_eq!(first.duration, 8);

        let second = &payload.scenes[1];
        assert_eq!(second.audio_script, "He came home.");
        assert_eq!(second.duration, DEFAULT_SEGMENT_SECONDS);
        assert_eq!(payload.original_story, "Tom sailed. He came home.");
    }
}
