//! External engine seams.
//!
//! Drivers talk to engines only through these traits so tests can swap in
//! in-process fakes.

use async_trait::async_trait;

use crate::job::{JobKind, SceneTask};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Network-level failure (connect, DNS, timeout).
    #[error("engine request failed: {0}")]
    Request(String),

    /// The engine answered with an error status.
    #[error("engine rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The engine answered with something unusable.
    #[error("invalid engine response: {0}")]
    Invalid(String),
}

/// One image generation request.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub prompt: String,
    pub detailed_prompt: String,
    pub seed: u64,
    pub filename_prefix: String,
}

/// An image engine that is submitted to and then polled.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Queue a request; returns the engine's submission id.
    async fn submit(&self, request: &ImageRequest) -> Result<String, EngineError>;

    /// Result location once ready, `None` while still pending.
    async fn poll(&self, submission_id: &str) -> Result<Option<String>, EngineError>;
}

/// A whole batch handed to a workflow engine.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequest<'a> {
    pub job_id: &'a str,
    pub kind: JobKind,
    pub scenes: &'a [SceneTask],
    pub callback_url: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct BatchAck {
    pub execution_id: Option<String>,
}

/// A workflow engine that generates a batch out of band and reports back
/// through the callback URL.
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    async fn submit_batch(&self, request: BatchRequest<'_>) -> Result<BatchAck, EngineError>;
}
