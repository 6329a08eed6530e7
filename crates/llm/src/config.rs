use std::time::Duration;

/// Placeholder key shipped in sample `.env` files; treated as unset.
const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

/// DeepSeek connection settings.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `None` selects the local generator.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.deepseek.com".into(),
            model: "deepseek-chat".into(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `DEEPSEEK_API_KEY`     | unset (local generator)    |
    /// | `DEEPSEEK_BASE_URL`    | `https://api.deepseek.com` |
    /// | `DEEPSEEK_MODEL`       | `deepseek-chat`            |
    /// | `DEEPSEEK_TIMEOUT_SECS`| `60`                       |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: normalize_api_key(std::env::var("DEEPSEEK_API_KEY").ok()),
            base_url: std::env::var("DEEPSEEK_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            model: std::env::var("DEEPSEEK_MODEL").unwrap_or(defaults.model),
            request_timeout: std::env::var("DEEPSEEK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
        }
    }
}

fn normalize_api_key(key: Option<String>) -> Option<String> {
    key.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && k != PLACEHOLDER_API_KEY)
}
