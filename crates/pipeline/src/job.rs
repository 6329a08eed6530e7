//! Job and scene records plus their state transitions.
//!
//! A job moves `queued -> running -> {completed | completed_with_errors | failed}`.
//! Terminal states are absorbing: every mutator below is a no-op once the
//! job has settled.

use serde::{Deserialize, Serialize};
use writetalent_core::storyboard::StoryScene;
use writetalent_core::types::Timestamp;

use crate::error::JobError;

pub type JobId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    ImageSet,
    Video,
}

impl JobKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ImageSet => "image-set",
            Self::Video => "video",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::CompletedWithErrors => "completed_with_errors",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::CompletedWithErrors | Self::Failed
        )
    }
}

/// Which completion strategy is driving a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Direct,
    Delegated,
}

/// Caller-supplied description of one scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneInput {
    pub scene_id: Option<i64>,
    /// Short visual prompt.
    pub prompt: String,
    pub detailed_prompt: Option<String>,
    pub story: Option<String>,
    pub voice_prompt: Option<String>,
    pub video_prompt: Option<String>,
    pub duration_seconds: Option<u32>,
}

impl SceneInput {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

impl From<StoryScene> for SceneInput {
    fn from(scene: StoryScene) -> Self {
        let prompt = if scene.image_prompt.trim().is_empty() {
            scene.story.clone()
        } else {
            scene.image_prompt
        };
        Self {
            scene_id: scene.id,
            prompt,
            detailed_prompt: scene.image_prompt_detailed.filter(|p| !p.trim().is_empty()),
            story: Some(scene.story).filter(|s| !s.trim().is_empty()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneErrorKind {
    SubmissionFailure,
    ItemTimeout,
    ItemGenerationError,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneError {
    pub kind: SceneErrorKind,
    pub message: String,
}

/// What a scene resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneOutcome {
    Result(String),
    Error(SceneError),
}

impl SceneOutcome {
    pub fn error(kind: SceneErrorKind, message: impl Into<String>) -> Self {
        Self::Error(SceneError {
            kind,
            message: message.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTask {
    pub index: usize,
    #[serde(flatten)]
    pub input: SceneInput,
    /// Engine-side handle (ComfyUI prompt id) once submitted.
    pub submission_id: Option<String>,
    pub result_url: Option<String>,
    pub error: Option<SceneError>,
}

impl SceneTask {
    pub fn is_resolved(&self) -> bool {
        self.result_url.is_some() || self.error.is_some()
    }
}

/// Entry in a job's error log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobErrorEntry {
    pub scene_index: Option<usize>,
    pub message: String,
    pub occurred_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: JobId,
    pub kind: JobKind,
    pub engine: EngineMode,
    pub status: JobStatus,
    pub scenes: Vec<SceneTask>,
    pub completed_scenes: usize,
    pub total_scenes: usize,
    /// Workflow engine execution handle (delegated mode).
    pub execution_id: Option<String>,
    /// Final video location (video jobs).
    pub output_url: Option<String>,
    /// Aggregate statistics reported by the workflow engine.
    pub stats: Option<serde_json::Value>,
    pub errors: Vec<JobErrorEntry>,
    pub last_error: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

/// Result of resolving one scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The scene was resolved; `settled` is true when this resolved the job.
    Applied { settled: bool },
    /// Nothing changed.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    JobTerminal,
    SceneResolved,
}

impl GenerationJob {
    pub fn new(
        id: JobId,
        kind: JobKind,
        engine: EngineMode,
        inputs: Vec<SceneInput>,
        now: Timestamp,
    ) -> Result<Self, JobError> {
        if inputs.is_empty() {
            return Err(JobError::InvalidInput(
                "at least one scene is required".into(),
            ));
        }
        let scenes: Vec<SceneTask> = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| SceneTask {
                index,
                input,
                submission_id: None,
                result_url: None,
                error: None,
            })
            .collect();

        Ok(Self {
            id,
            kind,
            engine,
            status: JobStatus::Queued,
            total_scenes: scenes.len(),
            scenes,
            completed_scenes: 0,
            execution_id: None,
            output_url: None,
            stats: None,
            errors: Vec::new(),
            last_error: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `queued -> running`. Returns `false` when the job was not queued.
    pub fn mark_running(&mut self, now: Timestamp) -> bool {
        if self.status != JobStatus::Queued {
            return false;
        }
        self.status = JobStatus::Running;
        self.started_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Resolve one scene and settle the job once every scene is resolved.
    pub fn resolve_scene(
        &mut self,
        index: usize,
        outcome: SceneOutcome,
        now: Timestamp,
    ) -> Result<Advance, JobError> {
        if self.is_terminal() {
            return Ok(Advance::Ignored(IgnoreReason::JobTerminal));
        }
        let total = self.scenes.len();
        let scene = self.scenes.get_mut(index).ok_or_else(|| {
            JobError::InvalidInput(format!("scene index {index} out of range (0..{total})"))
        })?;
        if scene.is_resolved() {
            return Ok(Advance::Ignored(IgnoreReason::SceneResolved));
        }

        match outcome {
            SceneOutcome::Result(url) => scene.result_url = Some(url),
            SceneOutcome::Error(error) => {
                self.errors.push(JobErrorEntry {
                    scene_index: Some(index),
                    message: error.message.clone(),
                    occurred_at: now,
                });
                self.last_error = Some(error.message.clone());
                scene.error = Some(error);
            }
        }

        self.mark_running(now);
        self.completed_scenes += 1;
        self.updated_at = now;

        let settled = self.completed_scenes == total;
        if settled {
            self.settle(now);
        }
        Ok(Advance::Applied { settled })
    }

    /// Resolve every outstanding scene with the same outcome. Returns the
    /// number of scenes resolved.
    pub fn resolve_outstanding(&mut self, outcome: &SceneOutcome, now: Timestamp) -> usize {
        let outstanding: Vec<usize> = self
            .scenes
            .iter()
            .filter(|s| !s.is_resolved())
            .map(|s| s.index)
            .collect();
        let mut resolved = 0;
        for index in outstanding {
            if let Ok(Advance::Applied { .. }) = self.resolve_scene(index, outcome.clone(), now) {
                resolved += 1;
            }
        }
        resolved
    }

    /// Job-fatal failure. Returns `false` when the job had already settled.
    pub fn fail(&mut self, message: impl Into<String>, now: Timestamp) -> bool {
        if self.is_terminal() {
            return false;
        }
        let message = message.into();
        self.errors.push(JobErrorEntry {
            scene_index: None,
            message: message.clone(),
            occurred_at: now,
        });
        self.last_error = Some(message);
        self.status = JobStatus::Failed;
        self.completed_at = Some(now);
        self.updated_at = now;
        true
    }

    fn settle(&mut self, now: Timestamp) {
        let any_error = self.scenes.iter().any(|s| s.error.is_some());
        self.status = if any_error {
            JobStatus::CompletedWithErrors
        } else {
            JobStatus::Completed
        };
        self.completed_at = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Utc;

    use super::*;

    fn job(scenes: usize) -> GenerationJob {
        let inputs = (0..scenes)
            .map(|i| SceneInput::from_prompt(format!("scene {i}")))
            .collect();
        GenerationJob::new("j1".into(), JobKind::ImageSet, EngineMode::Direct, inputs, Utc::now())
            .unwrap()
    }

    fn ok(url: &str) -> SceneOutcome {
        SceneOutcome::Result(url.into())
    }

    #[test]
    fn empty_input_is_rejected() {
        let result =
            GenerationJob::new("j".into(), JobKind::Video, EngineMode::Delegated, vec![], Utc::now());
        assert_matches!(result, Err(JobError::InvalidInput(_)));
    }

    #[test]
    fn new_job_is_queued_with_all_scenes() {
        let job = job(3);
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.total_scenes, 3);
        assert_eq!(job.completed_scenes, 0);
        assert_eq!(job.scenes[2].index, 2);
    }

    #[test]
    fn first_resolution_starts_a_queued_job() {
        let mut job = job(2);
        job.resolve_scene(0, ok("a"), Utc::now()).unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.started_at.is_some());
    }

    #[test]
    fn all_results_complete_the_job() {
        let mut job = job(2);
        let now = Utc::now();
        assert_eq!(job.resolve_scene(0, ok("a"), now).unwrap(), Advance::Applied { settled: false });
        assert_eq!(job.resolve_scene(1, ok("b"), now).unwrap(), Advance::Applied { settled: true });
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.completed_at.is_some());
    }

    #[test]
    fn any_scene_error_completes_with_errors() {
        let mut job = job(3);
        let now = Utc::now();
        job.resolve_scene(0, ok("a"), now).unwrap();
        job.resolve_scene(1, SceneOutcome::error(SceneErrorKind::ItemTimeout, "slow"), now)
            .unwrap();
        job.resolve_scene(2, ok("c"), now).unwrap();
        assert_eq!(job.status, JobStatus::CompletedWithErrors);
        assert_eq!(job.completed_scenes, 3);
        assert_eq!(job.last_error.as_deref(), Some("slow"));
        assert_eq!(job.errors[0].scene_index, Some(1));
    }

    #[test]
    fn resolving_twice_is_ignored() {
        let mut job = job(2);
        let now = Utc::now();
        job.resolve_scene(0, ok("a"), now).unwrap();
        assert_eq!(
            job.resolve_scene(0, ok("a"), now).unwrap(),
            Advance::Ignored(IgnoreReason::SceneResolved)
        );
        assert_eq!(job.completed_scenes, 1);
        assert_eq!(job.scenes[0].result_url.as_deref(), Some("a"));
    }

    #[test]
    fn out_of_range_index_is_invalid() {
        let mut job = job(1);
        assert_matches!(
            job.resolve_scene(5, ok("a"), Utc::now()),
            Err(JobError::InvalidInput(_))
        );
    }

    #[test]
    fn terminal_states_absorb_mutations() {
        let mut job = job(2);
        let now = Utc::now();
        assert!(job.fail("webhook down", now));
        assert_eq!(job.status, JobStatus::Failed);
        assert!(!job.fail("again", now));
        assert!(!job.mark_running(now));
        assert_eq!(
            job.resolve_scene(0, ok("late"), now).unwrap(),
            Advance::Ignored(IgnoreReason::JobTerminal)
        );
        assert_eq!(job.completed_scenes, 0);
        assert!(job.scenes.iter().all(|s| !s.is_resolved()));
    }

    #[test]
    fn resolve_outstanding_skips_resolved_scenes() {
        let mut job = job(3);
        let now = Utc::now();
        job.resolve_scene(1, ok("b"), now).unwrap();
        let resolved = job.resolve_outstanding(
            &SceneOutcome::error(SceneErrorKind::ItemTimeout, "no callback"),
            now,
        );
        assert_eq!(resolved, 2);
        assert_eq!(job.status, JobStatus::CompletedWithErrors);
        assert_eq!(job.scenes[1].result_url.as_deref(), Some("b"));
    }

    #[test]
    fn story_scene_without_image_prompt_uses_story() {
        let input = SceneInput::from(StoryScene {
            id: Some(2),
            story: "A fox ran.".into(),
            image_prompt: " ".into(),
            image_prompt_detailed: None,
        });
        assert_eq!(input.prompt, "A fox ran.");
        assert_eq!(input.scene_id, Some(2));
    }

    #[test]
    fn snapshot_serializes_snake_case() {
        let json = serde_json::to_value(job(1)).unwrap();
        assert_eq!(json["status"], "queued");
        assert_eq!(json["kind"], "image-set");
        assert_eq!(json["total_scenes"], 1);
        assert_eq!(json["scenes"][0]["prompt"], "scene 0");
    }
}
