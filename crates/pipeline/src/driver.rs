use async_trait::async_trait;

use crate::error::JobError;
use crate::job::EngineMode;
use crate::registry::JobRegistry;

/// A completion strategy that drives one job to a terminal state.
///
/// Drivers only mutate the job through the registry. Returning an error
/// marks the job `failed`.
#[async_trait]
pub trait CompletionDriver: Send + Sync {
    fn mode(&self) -> EngineMode;

    async fn run(&self, registry: &JobRegistry, job_id: &str) -> Result<(), JobError>;
}
