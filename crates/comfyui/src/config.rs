//! Environment-driven settings for the ComfyUI image engine.

use std::time::Duration;

/// Settings that shape every workflow submitted to ComfyUI.
#[derive(Debug, Clone)]
pub struct ComfyUIConfig {
    /// Base HTTP URL without trailing slash, e.g. `http://host:8188`.
    pub base_url: String,
    /// Optional path to a workflow JSON file replacing the built-in template.
    pub workflow_path: Option<String>,
    /// Optional checkpoint override for the loader node.
    pub model: Option<String>,
    pub positive_prompt_prefix: String,
    pub negative_prompt: String,
    pub image_width: u32,
    pub image_height: u32,
    pub sampler: String,
    pub scheduler: String,
    pub steps: u32,
    pub cfg: f64,
    pub guidance: f64,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for ComfyUIConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8188".into(),
            workflow_path: None,
            model: None,
            positive_prompt_prefix:
                "Children book illustration, bright colors, friendly characters,".into(),
            negative_prompt: "low quality, blurry, distorted, nsfw, text".into(),
            image_width: 960,
            image_height: 540,
            sampler: "dpmpp_2m".into(),
            scheduler: "normal".into(),
            steps: 24,
            cfg: 7.0,
            guidance: 3.5,
            request_timeout: Duration::from_millis(20_000),
        }
    }
}

impl ComfyUIConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                          | Default                  |
    /// |----------------------------------|--------------------------|
    /// | `COMFYUI_BASE_URL`               | `http://127.0.0.1:8188`  |
    /// | `COMFYUI_WORKFLOW_PATH`          | built-in Flux template   |
    /// | `COMFYUI_MODEL`                  | template checkpoint      |
    /// | `COMFYUI_POSITIVE_PROMPT_PREFIX` | children's book style    |
    /// | `COMFYUI_NEGATIVE_PROMPT`        | quality exclusions       |
    /// | `COMFYUI_IMAGE_WIDTH`            | `960`                    |
    /// | `COMFYUI_IMAGE_HEIGHT`           | `540`                    |
    /// | `COMFYUI_SAMPLER`                | `dpmpp_2m`               |
    /// | `COMFYUI_SCHEDULER`              | `normal`                 |
    /// | `COMFYUI_STEPS`                  | `24`                     |
    /// | `COMFYUI_CFG`                    | `7.0`                    |
    /// | `FLUX_GUIDANCE`                  | `3.5`                    |
    /// | `COMFYUI_REQUEST_TIMEOUT_MS`     | `20000`                  |
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("COMFYUI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            workflow_path: std::env::var("COMFYUI_WORKFLOW_PATH").ok(),
            model: std::env::var("COMFYUI_MODEL").ok(),
            positive_prompt_prefix: std::env::var("COMFYUI_POSITIVE_PROMPT_PREFIX")
                .unwrap_or(defaults.positive_prompt_prefix),
            negative_prompt: std::env::var("COMFYUI_NEGATIVE_PROMPT")
                .unwrap_or(defaults.negative_prompt),
            image_width: parse_env("COMFYUI_IMAGE_WIDTH", defaults.image_width),
            image_height: parse_env("COMFYUI_IMAGE_HEIGHT", defaults.image_height),
            sampler: std::env::var("COMFYUI_SAMPLER").unwrap_or(defaults.sampler),
            scheduler: std::env::var("COMFYUI_SCHEDULER").unwrap_or(defaults.scheduler),
            steps: parse_env("COMFYUI_STEPS", defaults.steps),
            cfg: parse_env("COMFYUI_CFG", defaults.cfg),
            guidance: parse_env("FLUX_GUIDANCE", defaults.guidance),
            request_timeout: Duration::from_millis(parse_env(
                "COMFYUI_REQUEST_TIMEOUT_MS",
                defaults.request_timeout.as_millis() as u64,
            )),
        }
    }
}

/// Parse an env var, falling back to `default` when unset or malformed.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
