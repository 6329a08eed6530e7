//! Periodic eviction of expired generation jobs.
//!
//! Ticks on the configured cleanup interval and prunes jobs whose last
//! update is older than the registry's TTL.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use writetalent_pipeline::JobRegistry;

/// Run the retention loop until `cancel` is triggered.
pub async fn run(registry: Arc<JobRegistry>, interval: Duration, cancel: CancellationToken) {
    tracing::info!(
        interval_ms = interval.as_millis() as u64,
        "Job retention task started"
    );

    let mut ticker = tokio::time::interval(interval);
    // First tick fires immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job retention task stopping");
                break;
            }
            _ = ticker.tick() => {
                let evicted = registry.prune_expired(Utc::now()).await;
                if evicted > 0 {
                    tracing::info!(evicted, "Job retention: pruned expired jobs");
                } else {
                    tracing::debug!("Job retention: nothing to prune");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use writetalent_pipeline::{EngineMode, JobKind, RegistryConfig, SceneInput};

    use super::*;

    #[tokio::test]
    async fn stops_when_cancelled() {
        let registry = Arc::new(JobRegistry::new(&RegistryConfig::default()));
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(registry, Duration::from_millis(10), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("task should stop promptly")
            .expect("task should not panic");
    }

    #[tokio::test]
    async fn prunes_jobs_past_their_ttl() {
        let config = RegistryConfig {
            job_ttl: Some(Duration::from_millis(1)),
            cleanup_interval: Some(Duration::from_millis(10)),
        };
        let registry = Arc::new(JobRegistry::new(&config));
        registry
            .create(JobKind::ImageSet, EngineMode::Direct, vec![SceneInput::from_prompt("a fox")])
            .await
            .expect("job should be created");

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::clone(&registry), Duration::from_millis(10), cancel.clone()));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(registry.is_empty().await);

        cancel.cancel();
        let _ = handle.await;
    }
}
