//! In-memory job registry.
//!
//! One registry is built per process and shared by handle between the HTTP
//! layer, the drivers and the retention sweep. The map lock is only held
//! for synchronous bookkeeping, never across engine I/O.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Notify, RwLock};
use writetalent_core::types::Timestamp;

use crate::config::RegistryConfig;
use crate::error::JobError;
use crate::job::{
    Advance, EngineMode, GenerationJob, JobId, JobKind, JobStatus, SceneErrorKind, SceneInput,
    SceneOutcome,
};

pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, GenerationJob>>,
    /// Woken whenever a job settles or is evicted.
    settled: Notify,
    job_ttl: Option<chrono::Duration>,
}

impl JobRegistry {
    pub fn new(config: &RegistryConfig) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            settled: Notify::new(),
            job_ttl: config
                .job_ttl
                .and_then(|ttl| chrono::Duration::from_std(ttl).ok()),
        }
    }

    /// Store a new `queued` job and return its initial snapshot.
    pub async fn create(
        &self,
        kind: JobKind,
        engine: EngineMode,
        inputs: Vec<SceneInput>,
    ) -> Result<GenerationJob, JobError> {
        let id = uuid::Uuid::new_v4().to_string();
        let job = GenerationJob::new(id.clone(), kind, engine, inputs, Utc::now())?;
        self.jobs.write().await.insert(id, job.clone());
        Ok(job)
    }

    /// Independent copy of the current record.
    pub async fn get(&self, id: &str) -> Result<GenerationJob, JobError> {
        self.jobs
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| JobError::not_found(id))
    }

    pub async fn status(&self, id: &str) -> Result<JobStatus, JobError> {
        self.jobs
            .read()
            .await
            .get(id)
            .map(|job| job.status)
            .ok_or_else(|| JobError::not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `queued -> running`, recording the engine's execution handle when
    /// one was returned.
    pub async fn mark_running(
        &self,
        id: &str,
        execution_id: Option<String>,
    ) -> Result<(), JobError> {
        self.mutate(id, |job, now| {
            if job.is_terminal() {
                return;
            }
            job.mark_running(now);
            if execution_id.is_some() {
                job.execution_id = execution_id;
                job.updated_at = now;
            }
        })
        .await
    }

    /// Switch the strategy recorded on a job (delegated -> direct fallback).
    pub async fn set_engine(&self, id: &str, engine: EngineMode) -> Result<(), JobError> {
        self.mutate(id, |job, now| {
            if !job.is_terminal() {
                job.engine = engine;
                job.updated_at = now;
            }
        })
        .await
    }

    /// Remember the engine-side id a scene was submitted under.
    pub async fn record_submission(
        &self,
        id: &str,
        index: usize,
        submission_id: &str,
    ) -> Result<(), JobError> {
        self.mutate(id, |job, now| {
            if job.is_terminal() {
                return;
            }
            if let Some(scene) = job.scenes.get_mut(index) {
                scene.submission_id = Some(submission_id.to_string());
                job.updated_at = now;
            }
        })
        .await
    }

    /// Resolve one scene. Idempotent: a resolved scene or a settled job is
    /// reported as [`Advance::Ignored`].
    pub async fn advance(
        &self,
        id: &str,
        index: usize,
        outcome: SceneOutcome,
    ) -> Result<Advance, JobError> {
        let advance = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(id).ok_or_else(|| JobError::not_found(id))?;
            job.resolve_scene(index, outcome, Utc::now())?
        };
        if let Advance::Applied { settled: true } = advance {
            tracing::info!(job_id = %id, "Generation job settled");
            self.settled.notify_waiters();
        }
        Ok(advance)
    }

    /// Job-fatal failure. Returns `false` when the job had already settled.
    pub async fn fail(&self, id: &str, message: &str) -> Result<bool, JobError> {
        let failed = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(id).ok_or_else(|| JobError::not_found(id))?;
            job.fail(message, Utc::now())
        };
        if failed {
            tracing::warn!(job_id = %id, error = message, "Generation job failed");
            self.settled.notify_waiters();
        }
        Ok(failed)
    }

    /// Resolve every outstanding scene with an `item_timeout` error.
    /// Returns the number of scenes expired.
    pub async fn expire_outstanding(&self, id: &str, message: &str) -> Result<usize, JobError> {
        let outcome = SceneOutcome::error(SceneErrorKind::ItemTimeout, message);
        let expired = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(id).ok_or_else(|| JobError::not_found(id))?;
            job.resolve_outstanding(&outcome, Utc::now())
        };
        if expired > 0 {
            self.settled.notify_waiters();
        }
        Ok(expired)
    }

    /// Run `apply` against the job under the write lock. Used for multi-step
    /// updates that must be observed atomically.
    pub(crate) async fn with_job<T>(
        &self,
        id: &str,
        apply: impl FnOnce(&mut GenerationJob, Timestamp) -> T,
    ) -> Result<T, JobError> {
        let (value, settled) = {
            let mut jobs = self.jobs.write().await;
            let job = jobs.get_mut(id).ok_or_else(|| JobError::not_found(id))?;
            let was_terminal = job.is_terminal();
            let value = apply(job, Utc::now());
            (value, !was_terminal && job.is_terminal())
        };
        if settled {
            self.settled.notify_waiters();
        }
        Ok(value)
    }

    async fn mutate(
        &self,
        id: &str,
        apply: impl FnOnce(&mut GenerationJob, Timestamp),
    ) -> Result<(), JobError> {
        self.with_job(id, apply).await
    }

    /// Evict jobs whose last update is older than the TTL. Returns the
    /// number of evicted jobs.
    pub async fn prune_expired(&self, now: Timestamp) -> usize {
        let Some(ttl) = self.job_ttl else {
            return 0;
        };
        let pruned = {
            let mut jobs = self.jobs.write().await;
            let before = jobs.len();
            jobs.retain(|_, job| now - job.updated_at <= ttl);
            before - jobs.len()
        };
        if pruned > 0 {
            self.settled.notify_waiters();
        }
        pruned
    }

    /// Wait until the job settles or `timeout` elapses.
    ///
    /// Returns `Ok(true)` once settled, `Ok(false)` on timeout and
    /// `NotFound` if the job was evicted while waiting.
    pub async fn wait_until_settled(&self, id: &str, timeout: Duration) -> Result<bool, JobError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.settled.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent settle is not missed.
            notified.as_mut().enable();

            if self.status(id).await?.is_terminal() {
                return Ok(true);
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::job::IgnoreReason;

    fn registry() -> JobRegistry {
        JobRegistry::new(&RegistryConfig::default())
    }

    fn inputs(n: usize) -> Vec<SceneInput> {
        (0..n).map(|i| SceneInput::from_prompt(format!("p{i}"))).collect()
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let registry = registry();
        let a = registry
            .create(JobKind::ImageSet, EngineMode::Direct, inputs(1))
            .await
            .unwrap();
        let b = registry
            .create(JobKind::ImageSet, EngineMode::Direct, inputs(1))
            .await
            .unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn empty_job_is_not_stored() {
        let registry = registry();
        let result = registry
            .create(JobKind::ImageSet, EngineMode::Direct, vec![])
            .await;
        assert_matches!(result, Err(JobError::InvalidInput(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn snapshot_is_independent_of_later_updates() {
        let registry = registry();
        let job = registry
            .create(JobKind::ImageSet, EngineMode::Direct, inputs(2))
            .await
            .unwrap();
        let before = registry.get(&job.id).await.unwrap();
        registry
            .advance(&job.id, 0, SceneOutcome::Result("u".into()))
            .await
            .unwrap();
        assert_eq!(before.completed_scenes, 0);
        assert_eq!(registry.get(&job.id).await.unwrap().completed_scenes, 1);
    }

    #[tokio::test]
    async fn unknown_job_is_not_found() {
        let registry = registry();
        assert_matches!(registry.get("nope").await, Err(JobError::NotFound(_)));
        assert_matches!(
            registry.advance("nope", 0, SceneOutcome::Result("u".into())).await,
            Err(JobError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn advance_after_settle_is_ignored() {
        let registry = registry();
        let job = registry
            .create(JobKind::ImageSet, EngineMode::Direct, inputs(1))
            .await
            .unwrap();
        registry
            .advance(&job.id, 0, SceneOutcome::Result("u".into()))
            .await
            .unwrap();
        let again = registry
            .advance(&job.id, 0, SceneOutcome::Result("u".into()))
            .await
            .unwrap();
        assert_eq!(again, Advance::Ignored(IgnoreReason::JobTerminal));
        assert_eq!(registry.get(&job.id).await.unwrap().completed_scenes, 1);
    }

    #[tokio::test]
    async fn prune_respects_ttl() {
        let registry = JobRegistry::new(&RegistryConfig {
            job_ttl: Some(Duration::from_secs(60)),
            cleanup_interval: None,
        });
        let job = registry
            .create(JobKind::Video, EngineMode::Delegated, inputs(1))
            .await
            .unwrap();

        assert_eq!(registry.prune_expired(Utc::now()).await, 0);
        assert!(registry.get(&job.id).await.is_ok());

        let later = Utc::now() + chrono::Duration::seconds(61);
        assert_eq!(registry.prune_expired(later).await, 1);
        assert_matches!(registry.get(&job.id).await, Err(JobError::NotFound(_)));
    }

    #[tokio::test]
    async fn prune_disabled_without_ttl() {
        let registry = JobRegistry::new(&RegistryConfig {
            job_ttl: None,
            cleanup_interval: None,
        });
        registry
            .create(JobKind::Video, EngineMode::Delegated, inputs(1))
            .await
            .unwrap();
        let far_future = Utc::now() + chrono::Duration::days(365);
        assert_eq!(registry.prune_expired(far_future).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn wait_until_settled_wakes_on_resolution() {
        let registry = std::sync::Arc::new(registry());
        let job = registry
            .create(JobKind::ImageSet, EngineMode::Delegated, inputs(1))
            .await
            .unwrap();

        let waiter = {
            let registry = registry.clone();
            let id = job.id.clone();
            tokio::spawn(async move { registry.wait_until_settled(&id, Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        registry
            .advance(&job.id, 0, SceneOutcome::Result("u".into()))
            .await
            .unwrap();

        assert!(waiter.await.unwrap().unwrap());
    }

    #[tokio::test]
    async fn wait_until_settled_times_out() {
        let registry = registry();
        let job = registry
            .create(JobKind::ImageSet, EngineMode::Delegated, inputs(1))
            .await
            .unwrap();
        let settled = registry
            .wait_until_settled(&job.id, Duration::from_millis(20))
            .await
            .unwrap();
        assert!(!settled);
    }

    #[tokio::test]
    async fn expire_outstanding_settles_with_timeouts() {
        let registry = registry();
        let job = registry
            .create(JobKind::ImageSet, EngineMode::Delegated, inputs(2))
            .await
            .unwrap();
        registry
            .advance(&job.id, 0, SceneOutcome::Result("u".into()))
            .await
            .unwrap();
        assert_eq!(registry.expire_outstanding(&job.id, "no callback").await.unwrap(), 1);

        let job = registry.get(&job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::CompletedWithErrors);
        assert_eq!(
            job.scenes[1].error.as_ref().map(|e| e.kind),
            Some(SceneErrorKind::ItemTimeout)
        );
    }
}
