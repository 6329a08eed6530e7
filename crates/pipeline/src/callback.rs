//! Applying workflow-engine callbacks to a job.
//!
//! A callback is the single inbound message of a delegated job. It either
//! fails the whole batch or carries per-scene results, and it always
//! leaves the job settled.

use writetalent_core::types::Timestamp;
use writetalent_n8n::{CallbackImage, CallbackPayload};

use crate::error::JobError;
use crate::job::{Advance, GenerationJob, JobKind, JobStatus, SceneErrorKind, SceneOutcome};
use crate::registry::JobRegistry;

/// Error recorded on scenes the workflow engine did not report on.
pub const UNREPORTED_SCENE_ERROR: &str = "no result reported by workflow engine";

/// Summary of what a callback changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub status: JobStatus,
    /// Scenes resolved with a reported result or error.
    pub reported: usize,
    /// Reported entries that matched no scene.
    pub unmatched: usize,
}

impl JobRegistry {
    /// Apply a workflow-engine callback to job `id`.
    ///
    /// Fails with `NotFound` for unknown (or already evicted) jobs and with
    /// `CallbackMismatch` when the job is of another kind or has already
    /// settled. Neither creates any state.
    pub async fn apply_callback(
        &self,
        id: &str,
        kind: JobKind,
        payload: &CallbackPayload,
    ) -> Result<CallbackOutcome, JobError> {
        let outcome = self
            .with_job(id, |job, now| job.apply_callback(kind, payload, now))
            .await??;
        tracing::info!(
            job_id = %id,
            status = ?outcome.status,
            reported = outcome.reported,
            unmatched = outcome.unmatched,
            "Workflow callback applied",
        );
        Ok(outcome)
    }
}

impl GenerationJob {
    pub fn apply_callback(
        &mut self,
        kind: JobKind,
        payload: &CallbackPayload,
        now: Timestamp,
    ) -> Result<CallbackOutcome, JobError> {
        if self.kind != kind {
            return Err(self.mismatch(format!(
                "callback for a {} job, job is {}",
                kind.as_str(),
                self.kind.as_str()
            )));
        }
        if self.is_terminal() {
            return Err(self.mismatch("job already settled".into()));
        }

        if payload.stats.is_some() {
            self.stats = payload.stats.clone();
        }

        let batch_error = payload
            .error
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);

        if payload.is_failure() && !payload.has_results() {
            let message = batch_error.unwrap_or_else(|| "workflow reported failure".into());
            self.fail(message, now);
            return Ok(CallbackOutcome {
                status: self.status,
                reported: 0,
                unmatched: 0,
            });
        }

        self.mark_running(now);

        let mut reported = 0;
        let mut unmatched = 0;

        for image in payload.images.iter().flatten() {
            let Some(index) = self.match_scene(image) else {
                unmatched += 1;
                continue;
            };
            let outcome = match (&image.image_url, &image.error) {
                (Some(url), _) if !url.is_empty() => SceneOutcome::Result(url.clone()),
                (_, Some(error)) if !error.is_empty() => {
                    SceneOutcome::error(SceneErrorKind::ItemGenerationError, error.clone())
                }
                _ => SceneOutcome::error(SceneErrorKind::ItemGenerationError, "no image returned"),
            };
            if let Ok(Advance::Applied { .. }) = self.resolve_scene(index, outcome, now) {
                reported += 1;
            }
        }

        if let Some(url) = payload.final_video_url() {
            self.output_url = Some(url.to_string());
            self.updated_at = now;
            reported += self.resolve_outstanding(&SceneOutcome::Result(url.to_string()), now);
        }

        let leftover = batch_error.unwrap_or_else(|| UNREPORTED_SCENE_ERROR.to_string());
        self.resolve_outstanding(
            &SceneOutcome::error(SceneErrorKind::ItemGenerationError, leftover),
            now,
        );

        Ok(CallbackOutcome {
            status: self.status,
            reported,
            unmatched,
        })
    }

    fn match_scene(&self, image: &CallbackImage) -> Option<usize> {
        if let Some(index) = image.scene_index.filter(|i| *i < self.scenes.len()) {
            return Some(index);
        }
        let scene_id = image.scene_id?;
        self.scenes
            .iter()
            .find(|scene| scene.input.scene_id.unwrap_or(scene.index as i64 + 1) == scene_id)
            .map(|scene| scene.index)
    }

    fn mismatch(&self, reason: String) -> JobError {
        JobError::CallbackMismatch {
            id: self.id.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;
    use serde_json::json;

    use super::*;
    use crate::job::{EngineMode, SceneInput};

    fn job(kind: JobKind, scenes: usize) -> GenerationJob {
        let inputs = (0..scenes)
            .map(|i| SceneInput {
                scene_id: Some(i as i64 + 1),
                ..SceneInput::from_prompt(format!("p{i}"))
            })
            .collect();
        GenerationJob::new("j".into(), kind, EngineMode::Delegated, inputs, Utc::now()).unwrap()
    }

    fn payload(value: serde_json::Value) -> CallbackPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn image_results_resolve_matching_scenes() {
        let mut job = job(JobKind::ImageSet, 2);
        let outcome = job
            .apply_callback(
                JobKind::ImageSet,
                &payload(json!({
                    "status": "completed",
                    "images": [
                        { "scene_index": 0, "imageUrl": "http://img/0.png" },
                        { "scene_id": 2, "imageUrl": "http://img/1.png" }
                    ],
                    "stats": { "success": 2 }
                })),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.reported, 2);
        assert_eq!(job.scenes[1].result_url.as_deref(), Some("http://img/1.png"));
        assert_eq!(job.stats, Some(json!({ "success": 2 })));
    }

    #[test]
    fn unreported_scenes_get_errors() {
        let mut job = job(JobKind::ImageSet, 3);
        let outcome = job
            .apply_callback(
                JobKind::ImageSet,
                &payload(json!({
                    "images": [
                        { "scene_index": 0, "imageUrl": "http://img/0.png" },
                        { "scene_index": 1, "error": "oom" },
                        { "scene_index": 9, "imageUrl": "http://img/9.png" }
                    ]
                })),
                Utc::now(),
            )
            .unwrap();

        assert_eq!(outcome.status, JobStatus::CompletedWithErrors);
        assert_eq!(outcome.unmatched, 1);
        assert_eq!(job.completed_scenes, 3);
        assert_eq!(job.scenes[1].error.as_ref().unwrap().message, "oom");
        assert_eq!(
            job.scenes[2].error.as_ref().unwrap().message,
            UNREPORTED_SCENE_ERROR
        );
    }

    #[test]
    fn batch_error_without_results_fails_job() {
        let mut job = job(JobKind::Video, 2);
        let outcome = job
            .apply_callback(
                JobKind::Video,
                &payload(json!({ "status": "failed", "error": "render crashed" })),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(job.last_error.as_deref(), Some("render crashed"));
        assert_eq!(job.completed_scenes, 0);
    }

    #[test]
    fn failed_status_with_blank_video_url_fails_job() {
        let mut job = job(JobKind::Video, 2);
        let outcome = job
            .apply_callback(
                JobKind::Video,
                &payload(json!({ "status": "failed", "videoUrl": "" })),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(job.completed_scenes, 0);
        assert!(job.output_url.is_none());
    }

    #[test]
    fn video_url_resolves_every_segment() {
        let mut job = job(JobKind::Video, 3);
        let outcome = job
            .apply_callback(
                JobKind::Video,
                &payload(json!({ "status": "completed", "videoUrl": "http://v/final.mp4" })),
                Utc::now(),
            )
            .unwrap();
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(job.output_url.as_deref(), Some("http://v/final.mp4"));
        assert!(job
            .scenes
            .iter()
            .all(|s| s.result_url.as_deref() == Some("http://v/final.mp4")));
    }

    #[test]
    fn empty_completed_callback_settles_with_errors() {
        let mut job = job(JobKind::Video, 1);
        let outcome = job
            .apply_callback(JobKind::Video, &payload(json!({ "status": "completed" })), Utc::now())
            .unwrap();
        assert_eq!(outcome.status, JobStatus::CompletedWithErrors);
    }

    #[test]
    fn settled_or_wrong_kind_is_mismatch() {
        let mut job = job(JobKind::ImageSet, 1);
        assert_matches!(
            job.apply_callback(JobKind::Video, &CallbackPayload::default(), Utc::now()),
            Err(JobError::CallbackMismatch { .. })
        );

        job.fail("boom", Utc::now());
        assert_matches!(
            job.apply_callback(JobKind::ImageSet, &CallbackPayload::default(), Utc::now()),
            Err(JobError::CallbackMismatch { .. })
        );
    }
}
