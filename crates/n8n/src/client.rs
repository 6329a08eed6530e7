//! Webhook trigger client.

use serde::{Deserialize, Serialize};

use crate::config::N8nConfig;
use crate::payload::{ImageBatchPayload, VideoBatchPayload, IMAGE_BATCH_WEBHOOK, VIDEO_BATCH_WEBHOOK};

/// HTTP client for the webhooks of a single n8n instance.
#[derive(Debug, Clone)]
pub struct N8nClient {
    client: reqwest::Client,
    base_url: String,
}

/// Acknowledgement returned by a webhook trigger.
///
/// Workflows answer with either `execution_id` or `executionId`, or with a
/// body that is not JSON at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookAck {
    #[serde(default, alias = "executionId", deserialize_with = "string_or_number")]
    pub execution_id: Option<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum N8nError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("n8n webhook error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl N8nClient {
    pub fn new(config: &N8nConfig) -> Result<Self, N8nError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config.base_url.clone()))
    }

    pub fn with_client(client: reqwest::Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn webhook_url(&self, path: &str) -> String {
        format!("{}/webhook/{}", self.base_url, path)
    }

    /// Start the parallel story-image workflow.
    pub async fn trigger_image_batch(
        &self,
        payload: &ImageBatchPayload,
    ) -> Result<WebhookAck, N8nError> {
        self.trigger_webhook(IMAGE_BATCH_WEBHOOK, payload).await
    }

    /// Start the scenes-to-video workflow.
    pub async fn trigger_video_batch(
        &self,
        payload: &VideoBatchPayload,
    ) -> Result<WebhookAck, N8nError> {
        self.trigger_webhook(VIDEO_BATCH_WEBHOOK, payload).await
    }

    async fn trigger_webhook<T: Serialize>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<WebhookAck, N8nError> {
        let response = self
            .client
            .post(self.webhook_url(path))
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(N8nError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(parse_ack(&body))
    }
}

fn parse_ack(body: &str) -> WebhookAck {
    serde_json::from_str(body).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn webhook_url_joins_path() {
        let client = N8nClient::with_client(reqwest::Client::new(), "http://n8n:5678/".into());
        assert_eq!(
            client.webhook_url(IMAGE_BATCH_WEBHOOK),
            "http://n8n:5678/webhook/story_images_parallel"
        );
    }

    #[test]
    fn ack_accepts_both_spellings() {
        assert_eq!(parse_ack(r#"{"execution_id":"1"}"#).execution_id.as_deref(), Some("1"));
        assert_eq!(parse_ack(r#"{"executionId":"2"}"#).execution_id.as_deref(), Some("2"));
        assert_eq!(parse_ack(r#"{"executionId":17}"#).execution_id.as_deref(), Some("17"));
    }

    #[test]
    fn non_json_ack_is_empty() {
        assert!(parse_ack("Workflow was started").execution_id.is_none());
        assert!(parse_ack("").execution_id.is_none());
    }

    #[tokio::test]
    async fn unreachable_instance_is_a_request_error() {
        let client = N8nClient::with_client(reqwest::Client::new(), "http://127.0.0.1:1".into());
        let payload = VideoBatchPayload {
            scenes: Vec::new(),
            original_story: String::new(),
            task_id: "task-1".into(),
            callback_url: "http://backend.test/api/v1/drama/callback/task-1".into(),
        };
        assert_matches!(
            client.trigger_video_batch(&payload).await,
            Err(N8nError::Request(_))
        );
    }
}
