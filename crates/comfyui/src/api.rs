//! Client for the three ComfyUI HTTP endpoints the image pipeline needs:
//! `POST /prompt`, `GET /history/{id}` and `GET /view`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::history::OutputImage;

#[derive(Debug, Clone)]
pub struct ComfyUIApi {
    client: reqwest::Client,
    base_url: String,
}

/// Body of a successful `POST /prompt`.
#[derive(Debug, Deserialize)]
pub struct QueuedPrompt {
    pub prompt_id: String,
    /// Queue position at submission time.
    #[serde(default)]
    pub number: i32,
}

#[derive(Debug, thiserror::Error)]
pub enum ComfyUIApiError {
    /// Connect, TLS or timeout failure before any status was received.
    #[error("ComfyUI request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-2xx answer; `body` is kept verbatim for logs.
    #[error("ComfyUI rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid ComfyUI URL: {0}")]
    InvalidUrl(String),
}

impl ComfyUIApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8188`.
    pub fn new(base_url: String, request_timeout: Duration) -> Result<Self, ComfyUIApiError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Queue a rendered workflow graph under `client_id`.
    pub async fn submit_workflow(
        &self,
        workflow: &serde_json::Value,
        client_id: &str,
    ) -> Result<QueuedPrompt, ComfyUIApiError> {
        let request = self
            .client
            .post(format!("{}/prompt", self.base_url))
            .json(&serde_json::json!({ "prompt": workflow, "client_id": client_id }));
        request_json(request).await
    }

    /// Execution history of one prompt. Empty (`{}`) while it is still
    /// queued or running.
    pub async fn get_history(&self, prompt_id: &str) -> Result<serde_json::Value, ComfyUIApiError> {
        let request = self
            .client
            .get(format!("{}/history/{prompt_id}", self.base_url));
        request_json(request).await
    }

    /// Public URL under which ComfyUI serves a generated image.
    pub fn view_url(&self, image: &OutputImage) -> Result<String, ComfyUIApiError> {
        let mut url = reqwest::Url::parse(&format!("{}/view", self.base_url))
            .map_err(|e| ComfyUIApiError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("filename", &image.filename)
            .append_pair("subfolder", &image.subfolder)
            .append_pair("type", &image.kind);
        Ok(url.into())
    }
}

async fn request_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ComfyUIApiError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|e| format!("<body unavailable: {e}>"));
    Err(ComfyUIApiError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ComfyUIApi {
        ComfyUIApi::with_client(reqwest::Client::new(), "http://comfy:8188/".into())
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(api().base_url(), "http://comfy:8188");
    }

    #[test]
    fn view_url_encodes_query() {
        let image = OutputImage {
            filename: "story scene 1.png".into(),
            subfolder: "runs/a&b".into(),
            kind: "output".into(),
        };
        let url = api().view_url(&image).unwrap();
        assert_eq!(
            url,
            "http://comfy:8188/view?filename=story+scene+1.png&subfolder=runs%2Fa%26b&type=output"
        );
    }

    #[test]
    fn queued_prompt_tolerates_missing_number() {
        let queued: QueuedPrompt =
            serde_json::from_str(r#"{"prompt_id":"abc-123"}"#).unwrap();
        assert_eq!(queued.prompt_id, "abc-123");
        assert_eq!(queued.number, 0);
    }
}
