//! Job creation and driver supervision.
//!
//! [`JobDispatcher::create_job`] stores the job, picks a completion driver
//! and spawns it. A supervising task awaits the driver so that an error or
//! a panic always leaves the job `failed` rather than dangling.

use std::sync::Arc;

use crate::driver::CompletionDriver;
use crate::error::JobError;
use crate::job::{EngineMode, GenerationJob, JobKind, SceneInput};
use crate::registry::JobRegistry;

#[derive(Clone)]
pub struct JobDispatcher {
    registry: Arc<JobRegistry>,
    direct: Option<Arc<dyn CompletionDriver>>,
    delegated: Option<Arc<dyn CompletionDriver>>,
}

impl JobDispatcher {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self {
            registry,
            direct: None,
            delegated: None,
        }
    }

    pub fn with_direct(mut self, driver: Arc<dyn CompletionDriver>) -> Self {
        self.direct = Some(driver);
        self
    }

    pub fn with_delegated(mut self, driver: Arc<dyn CompletionDriver>) -> Self {
        self.delegated = Some(driver);
        self
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn has_delegated(&self) -> bool {
        self.delegated.is_some()
    }

    /// The strategy a new job of `kind` would use.
    pub fn engine_for(&self, kind: JobKind, prefer_delegated: bool) -> Option<EngineMode> {
        self.select(kind, prefer_delegated).map(|driver| driver.mode())
    }

    fn select(&self, kind: JobKind, prefer_delegated: bool) -> Option<&Arc<dyn CompletionDriver>> {
        match kind {
            JobKind::Video => self.delegated.as_ref(),
            JobKind::ImageSet if prefer_delegated => {
                self.delegated.as_ref().or(self.direct.as_ref())
            }
            JobKind::ImageSet => self.direct.as_ref().or(self.delegated.as_ref()),
        }
    }

    /// Create a job and start completing it in the background.
    ///
    /// Returns the initial `queued` snapshot without waiting for any scene.
    /// When no engine can serve `kind`, the job is stored already `failed`.
    pub async fn create_job(
        &self,
        kind: JobKind,
        inputs: Vec<SceneInput>,
        prefer_delegated: bool,
    ) -> Result<GenerationJob, JobError> {
        let Some(driver) = self.select(kind, prefer_delegated).cloned() else {
            let job = self
                .registry
                .create(kind, EngineMode::Delegated, inputs)
                .await?;
            let message = format!("no engine configured for {} jobs", kind.as_str());
            self.registry.fail(&job.id, &message).await?;
            return self.registry.get(&job.id).await;
        };

        let job = self.registry.create(kind, driver.mode(), inputs).await?;
        tracing::info!(
            job_id = %job.id,
            kind = kind.as_str(),
            engine = ?driver.mode(),
            scenes = job.total_scenes,
            "Generation job created",
        );
        self.spawn(driver, job.id.clone());
        Ok(job)
    }

    fn spawn(&self, driver: Arc<dyn CompletionDriver>, job_id: String) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let task = {
                let registry = Arc::clone(&registry);
                let job_id = job_id.clone();
                tokio::spawn(async move { driver.run(&registry, &job_id).await })
            };

            let failure = match task.await {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(join_error) => Some(format!("generation task aborted: {join_error}")),
            };

            if let Some(message) = failure {
                match registry.fail(&job_id, &message).await {
                    Ok(_) | Err(JobError::NotFound(_)) => {}
                    Err(e) => {
                        tracing::error!(job_id = %job_id, error = %e, "Failed to mark job failed")
                    }
                }
            }
        });
    }
}
