//! Direct completion: submit each scene to the image engine and poll for
//! its result, one scene at a time in index order.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use crate::config::DirectConfig;
use crate::driver::CompletionDriver;
use crate::engine::{EngineError, ImageEngine, ImageRequest};
use crate::error::JobError;
use crate::job::{Advance, EngineMode, IgnoreReason, SceneErrorKind, SceneOutcome, SceneTask};
use crate::registry::JobRegistry;

/// Seeds are drawn from `0..MAX_SEED`.
const MAX_SEED: u64 = 1_000_000_000;

pub struct DirectDriver {
    engine: Arc<dyn ImageEngine>,
    config: DirectConfig,
}

impl DirectDriver {
    pub fn new(engine: Arc<dyn ImageEngine>, config: DirectConfig) -> Self {
        Self { engine, config }
    }

    /// A submission that exhausts its retries before any scene of the job
    /// reached the engine is job-fatal. Later ones only fail their scene.
    async fn process_scene(
        &self,
        registry: &JobRegistry,
        job_id: &str,
        scene: &SceneTask,
        dispatched: bool,
    ) -> Result<SceneOutcome, JobError> {
        let request = build_request(job_id, scene);

        let submission_id = match self.submit_with_retry(job_id, scene.index, &request).await {
            Ok(id) => id,
            Err(e) if !dispatched => return Err(JobError::SubmissionFailure(e.to_string())),
            Err(e) => {
                return Ok(SceneOutcome::error(
                    SceneErrorKind::SubmissionFailure,
                    e.to_string(),
                ))
            }
        };
        tracing::debug!(
            job_id,
            scene_index = scene.index,
            prompt_id = %submission_id,
            "Scene submitted",
        );
        registry
            .record_submission(job_id, scene.index, &submission_id)
            .await?;

        Ok(self.wait_for_result(&submission_id).await)
    }

    async fn submit_with_retry(
        &self,
        job_id: &str,
        scene_index: usize,
        request: &ImageRequest,
    ) -> Result<String, EngineError> {
        let attempts = self.config.submit_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.engine.submit(request).await {
                Ok(id) => return Ok(id),
                Err(e) if attempt < attempts => {
                    tracing::warn!(
                        job_id,
                        scene_index,
                        attempt,
                        error = %e,
                        "Scene submission failed, retrying",
                    );
                    tokio::time::sleep(self.config.submit_retry_delay * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn wait_for_result(&self, submission_id: &str) -> SceneOutcome {
        let deadline = tokio::time::Instant::now() + self.config.result_timeout;
        loop {
            match self.engine.poll(submission_id).await {
                Ok(Some(url)) => return SceneOutcome::Result(url),
                Ok(None) => {}
                Err(e) => {
                    return SceneOutcome::error(SceneErrorKind::ItemGenerationError, e.to_string())
                }
            }

            if tokio::time::Instant::now() + self.config.poll_interval > deadline {
                return SceneOutcome::error(
                    SceneErrorKind::ItemTimeout,
                    format!(
                        "image {submission_id} not ready after {}ms",
                        self.config.result_timeout.as_millis()
                    ),
                );
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[async_trait]
impl CompletionDriver for DirectDriver {
    fn mode(&self) -> EngineMode {
        EngineMode::Direct
    }

    async fn run(&self, registry: &JobRegistry, job_id: &str) -> Result<(), JobError> {
        let job = match registry.get(job_id).await {
            Ok(job) => job,
            Err(JobError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        registry.mark_running(job_id, None).await?;
        tracing::info!(job_id, scenes = job.total_scenes, "Direct generation started");

        let mut dispatched = job
            .scenes
            .iter()
            .any(|s| s.submission_id.is_some() || s.result_url.is_some());

        for scene in job.scenes.iter().filter(|s| !s.is_resolved()) {
            let outcome = self.process_scene(registry, job_id, scene, dispatched).await;
            dispatched |= outcome.is_ok();
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(JobError::NotFound(_)) => {
                    tracing::warn!(job_id, "Job evicted while generating, stopping");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };

            if let SceneOutcome::Error(error) = &outcome {
                tracing::warn!(
                    job_id,
                    scene_index = scene.index,
                    kind = ?error.kind,
                    error = %error.message,
                    "Scene failed",
                );
            }

            match registry.advance(job_id, scene.index, outcome).await {
                Ok(Advance::Ignored(IgnoreReason::JobTerminal)) => {
                    tracing::debug!(job_id, "Job settled elsewhere, stopping");
                    return Ok(());
                }
                Ok(_) => {}
                Err(JobError::NotFound(_)) => {
                    tracing::warn!(job_id, "Job evicted while generating, stopping");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}

fn build_request(job_id: &str, scene: &SceneTask) -> ImageRequest {
    let seed = rand::rng().random_range(0..MAX_SEED);
    let prompt = if scene.input.prompt.trim().is_empty() {
        scene.input.story.clone().unwrap_or_default()
    } else {
        scene.input.prompt.clone()
    };
    let short_id: String = job_id.chars().take(8).collect();
    ImageRequest {
        prompt,
        detailed_prompt: scene.input.detailed_prompt.clone().unwrap_or_default(),
        seed,
        filename_prefix: format!("story_{short_id}_scene_{}_{seed}", scene.index),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::SceneInput;

    #[test]
    fn request_falls_back_to_story_text() {
        let scene = SceneTask {
            index: 2,
            input: SceneInput {
                story: Some("A fox ran.".into()),
                ..SceneInput::default()
            },
            submission_id: None,
            result_url: None,
            error: None,
        };
        let request = build_request("0123456789", &scene);
        assert_eq!(request.prompt, "A fox ran.");
        assert_eq!(request.detailed_prompt, "");
        assert!(request.filename_prefix.starts_with("story_01234567_scene_2_"));
        assert!(request.seed < MAX_SEED);
    }
}
