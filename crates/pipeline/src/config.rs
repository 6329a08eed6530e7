//! Tunables for the registry and both completion strategies.

use std::time::Duration;

use crate::job::JobKind;

/// Submit-then-poll loop against the direct image engine.
#[derive(Debug, Clone)]
pub struct DirectConfig {
    /// Submission attempts per scene (at least one).
    pub submit_attempts: u32,
    /// Base retry delay, multiplied by the attempt number.
    pub submit_retry_delay: Duration,
    pub poll_interval: Duration,
    /// Total wait for one scene's result.
    pub result_timeout: Duration,
}

impl Default for DirectConfig {
    fn default() -> Self {
        Self {
            submit_attempts: 3,
            submit_retry_delay: Duration::from_millis(2_000),
            poll_interval: Duration::from_millis(2_000),
            result_timeout: Duration::from_millis(300_000),
        }
    }
}

impl DirectConfig {
    /// | Env Var                         | Default  |
    /// |---------------------------------|----------|
    /// | `COMFYUI_SUBMIT_RETRY`          | `3`      |
    /// | `COMFYUI_SUBMIT_RETRY_DELAY_MS` | `2000`   |
    /// | `COMFYUI_POLL_INTERVAL_MS`      | `2000`   |
    /// | `COMFYUI_TIMEOUT_MS`            | `300000` |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            submit_attempts: env_u64("COMFYUI_SUBMIT_RETRY")
                .map(|n| n.max(1) as u32)
                .unwrap_or(defaults.submit_attempts),
            submit_retry_delay: env_millis("COMFYUI_SUBMIT_RETRY_DELAY_MS")
                .unwrap_or(defaults.submit_retry_delay),
            poll_interval: env_millis("COMFYUI_POLL_INTERVAL_MS")
                .filter(|d| !d.is_zero())
                .unwrap_or(defaults.poll_interval),
            result_timeout: env_millis("COMFYUI_TIMEOUT_MS").unwrap_or(defaults.result_timeout),
        }
    }
}

/// Retention of settled and abandoned jobs.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Jobs untouched for longer than this are evicted. `None` keeps jobs
    /// forever.
    pub job_ttl: Option<Duration>,
    /// Sweep period. `None` disables the sweep task.
    pub cleanup_interval: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            job_ttl: Some(Duration::from_millis(3_600_000)),
            cleanup_interval: Some(Duration::from_millis(600_000)),
        }
    }
}

impl RegistryConfig {
    /// A value of `0` disables the corresponding behaviour.
    ///
    /// | Env Var                           | Default   |
    /// |-----------------------------------|-----------|
    /// | `COMFYUI_JOB_TTL_MS`              | `3600000` |
    /// | `COMFYUI_JOB_CLEANUP_INTERVAL_MS` | `600000`  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            job_ttl: env_millis("COMFYUI_JOB_TTL_MS")
                .map(non_zero)
                .unwrap_or(defaults.job_ttl),
            cleanup_interval: env_millis("COMFYUI_JOB_CLEANUP_INTERVAL_MS")
                .map(non_zero)
                .unwrap_or(defaults.cleanup_interval),
        }
    }
}

/// Webhook-and-callback strategy.
#[derive(Debug, Clone)]
pub struct DelegatedConfig {
    /// Public base URL of this service, used to build callback URLs.
    pub callback_base_url: String,
    /// How long to wait for a callback before expiring outstanding scenes.
    pub callback_timeout: Duration,
}

impl Default for DelegatedConfig {
    fn default() -> Self {
        Self {
            callback_base_url: "http://localhost:3001".into(),
            callback_timeout: Duration::from_secs(1_800),
        }
    }
}

impl DelegatedConfig {
    /// | Env Var                     | Default                 |
    /// |-----------------------------|-------------------------|
    /// | `BACKEND_URL`               | `http://localhost:3001` |
    /// | `N8N_CALLBACK_TIMEOUT_SECS` | `1800`                  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            callback_base_url: std::env::var("BACKEND_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.callback_base_url),
            callback_timeout: env_u64("N8N_CALLBACK_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.callback_timeout),
        }
    }

    /// Callback URL the workflow engine must POST to for `job_id`.
    pub fn callback_url(&self, kind: JobKind, job_id: &str) -> String {
        let base = self.callback_base_url.trim_end_matches('/');
        match kind {
            JobKind::ImageSet => format!("{base}/api/v1/ai/image-callback/{job_id}"),
            JobKind::Video => format!("{base}/api/v1/drama/callback/{job_id}"),
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_millis(key: &str) -> Option<Duration> {
    env_u64(key).map(Duration::from_millis)
}

fn non_zero(d: Duration) -> Option<Duration> {
    (!d.is_zero()).then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_urls_per_kind() {
        let config = DelegatedConfig {
            callback_base_url: "https://api.example.com/".into(),
            ..DelegatedConfig::default()
        };
        assert_eq!(
            config.callback_url(JobKind::ImageSet, "abc"),
            "https://api.example.com/api/v1/ai/image-callback/abc"
        );
        assert_eq!(
            config.callback_url(JobKind::Video, "abc"),
            "https://api.example.com/api/v1/drama/callback/abc"
        );
    }

    #[test]
    fn zero_duration_disables() {
        assert_eq!(non_zero(Duration::ZERO), None);
        assert_eq!(non_zero(Duration::from_secs(1)), Some(Duration::from_secs(1)));
    }
}
