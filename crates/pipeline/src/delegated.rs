//! Delegated completion: hand the whole batch to a workflow engine and
//! wait for its callback.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DelegatedConfig;
use crate::driver::CompletionDriver;
use crate::engine::{BatchRequest, WorkflowEngine};
use crate::error::JobError;
use crate::job::{EngineMode, JobKind};
use crate::registry::JobRegistry;

pub struct DelegatedDriver {
    engine: Arc<dyn WorkflowEngine>,
    /// Used for image sets when the batch submission fails.
    fallback: Option<Arc<dyn CompletionDriver>>,
    config: DelegatedConfig,
}

impl DelegatedDriver {
    pub fn new(engine: Arc<dyn WorkflowEngine>, config: DelegatedConfig) -> Self {
        Self {
            engine,
            fallback: None,
            config,
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn CompletionDriver>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Wait for the callback, then expire whatever it did not cover.
    async fn await_callback(&self, registry: &JobRegistry, job_id: &str) -> Result<(), JobError> {
        let timeout = self.config.callback_timeout;
        if registry.wait_until_settled(job_id, timeout).await? {
            return Ok(());
        }

        let message = format!("no callback within {}s", timeout.as_secs());
        let expired = registry.expire_outstanding(job_id, &message).await?;
        tracing::warn!(job_id, expired, "Workflow callback timed out");
        Ok(())
    }
}

#[async_trait]
impl CompletionDriver for DelegatedDriver {
    fn mode(&self) -> EngineMode {
        EngineMode::Delegated
    }

    async fn run(&self, registry: &JobRegistry, job_id: &str) -> Result<(), JobError> {
        let job = match registry.get(job_id).await {
            Ok(job) => job,
            Err(JobError::NotFound(_)) => return Ok(()),
            Err(e) => return Err(e),
        };
        let callback_url = self.config.callback_url(job.kind, job_id);

        let submitted = self
            .engine
            .submit_batch(BatchRequest {
                job_id,
                kind: job.kind,
                scenes: &job.scenes,
                callback_url: &callback_url,
            })
            .await;

        let result = match submitted {
            Ok(ack) => {
                tracing::info!(
                    job_id,
                    execution_id = ack.execution_id.as_deref().unwrap_or("unknown"),
                    %callback_url,
                    "Workflow batch submitted",
                );
                registry.mark_running(job_id, ack.execution_id).await?;
                self.await_callback(registry, job_id).await
            }
            Err(e) => match (&self.fallback, job.kind) {
                (Some(fallback), JobKind::ImageSet) => {
                    tracing::warn!(
                        job_id,
                        error = %e,
                        "Workflow submission failed, falling back to direct generation",
                    );
                    registry.set_engine(job_id, fallback.mode()).await?;
                    fallback.run(registry, job_id).await
                }
                _ => Err(JobError::SubmissionFailure(e.to_string())),
            },
        };

        match result {
            Err(JobError::NotFound(_)) => {
                tracing::warn!(job_id, "Job evicted before completion");
                Ok(())
            }
            other => other,
        }
    }
}
