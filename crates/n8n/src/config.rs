use std::time::Duration;

/// Connection settings for an n8n instance.
#[derive(Debug, Clone)]
pub struct N8nConfig {
    /// Base URL without trailing slash, e.g. `http://n8n:5678`.
    pub base_url: String,
    /// Timeout for the webhook trigger request (not the workflow itself).
    pub request_timeout: Duration,
}

impl N8nConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` when `N8N_BASE_URL` is unset or blank, which disables
    /// delegated generation.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `N8N_BASE_URL`             | unset   |
    /// | `N8N_REQUEST_TIMEOUT_SECS` | `30`    |
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("N8N_BASE_URL").ok()?;
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return None;
        }

        let timeout_secs: u64 = std::env::var("N8N_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Some(Self {
            base_url: base_url.to_string(),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
