#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use writetalent_api::auth::verification::VerificationStore;
use writetalent_api::config::ServerConfig;
use writetalent_api::router::build_app_router;
use writetalent_api::state::AppState;
use writetalent_core::storyboard::{StoryScene, Storyboard};
use writetalent_llm::{LlmError, Storyteller};
use writetalent_pipeline::delegated::DelegatedDriver;
use writetalent_pipeline::direct::DirectDriver;
use writetalent_pipeline::{
    BatchAck, BatchRequest, DelegatedConfig, DirectConfig, EngineError, ImageEngine, ImageRequest,
    JobDispatcher, JobRegistry, RegistryConfig, WorkflowEngine,
};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
    }
}

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

/// Image engine that finishes every submission on the first poll.
pub struct InstantImageEngine;

#[async_trait]
impl ImageEngine for InstantImageEngine {
    async fn submit(&self, request: &ImageRequest) -> Result<String, EngineError> {
        Ok(request.filename_prefix.clone())
    }

    async fn poll(&self, submission_id: &str) -> Result<Option<String>, EngineError> {
        Ok(Some(format!("http://images.test/{submission_id}.png")))
    }
}

/// Workflow engine that accepts every batch and never calls back on its own.
pub struct AcceptingWorkflowEngine;

#[async_trait]
impl WorkflowEngine for AcceptingWorkflowEngine {
    async fn submit_batch(&self, _: BatchRequest<'_>) -> Result<BatchAck, EngineError> {
        Ok(BatchAck {
            execution_id: Some("exec-42".into()),
        })
    }
}

/// Storyteller returning a fixed two-scene storyboard.
pub struct FakeStoryteller {
    pub fail: bool,
}

#[async_trait]
impl Storyteller for FakeStoryteller {
    fn provider(&self) -> &'static str {
        "fake"
    }

    async fn generate_storyboard(&self, _theme: &str, idea: &str) -> Result<Storyboard, LlmError> {
        if self.fail {
            return Err(LlmError::EmptyReply);
        }
        let scene = |id: i64, text: &str| StoryScene {
            id: Some(id),
            story: text.to_string(),
            image_prompt: format!("illustration of {text}"),
            image_prompt_detailed: None,
        };
        Ok(Storyboard {
            story: format!("Once upon a time, {idea}\n\nThe end."),
            scenes: vec![scene(1, "a dragon"), scene(2, "a garden")],
        })
    }

    async fn score_originality(&self, _idea: &str, _story: &str) -> i32 {
        88
    }
}

// ---------------------------------------------------------------------------
// App builders
// ---------------------------------------------------------------------------

/// Which collaborators a test app is wired with.
pub struct TestServices {
    pub workflow_engine: bool,
    pub storyteller_fails: bool,
}

impl Default for TestServices {
    fn default() -> Self {
        Self {
            workflow_engine: true,
            storyteller_fails: false,
        }
    }
}

fn test_dispatcher(workflow_engine: bool) -> JobDispatcher {
    let registry = Arc::new(JobRegistry::new(&RegistryConfig::default()));
    let direct = Arc::new(DirectDriver::new(
        Arc::new(InstantImageEngine),
        DirectConfig {
            submit_attempts: 1,
            submit_retry_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(5),
            result_timeout: Duration::from_secs(5),
        },
    ));

    let dispatcher = JobDispatcher::new(registry).with_direct(direct);
    if !workflow_engine {
        return dispatcher;
    }

    let delegated = DelegatedDriver::new(
        Arc::new(AcceptingWorkflowEngine),
        DelegatedConfig {
            callback_base_url: "http://backend.test".into(),
            callback_timeout: Duration::from_secs(60),
        },
    );
    dispatcher.with_delegated(Arc::new(delegated))
}

/// Application state wired with in-process fakes.
pub fn test_state(pool: PgPool, services: TestServices) -> AppState {
    AppState {
        pool,
        config: Arc::new(test_config()),
        dispatcher: test_dispatcher(services.workflow_engine),
        storyteller: Arc::new(FakeStoryteller {
            fail: services.storyteller_fails,
        }),
        verification_codes: Arc::new(VerificationStore::new()),
        mailer: None,
    }
}

/// Build the full application router with the production middleware stack.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app_router(test_state(pool, TestServices::default()), &test_config())
}

/// Like [`build_test_app`], with explicit collaborators.
pub fn build_test_app_with(pool: PgPool, services: TestServices) -> Router {
    build_app_router(test_state(pool, services), &test_config())
}

/// A pool that never connects, for routes that do not touch the database.
pub fn lazy_pool() -> PgPool {
    sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://writetalent@127.0.0.1:1/unused")
        .expect("lazy pool should build")
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: impl Into<Body>) -> Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll a job route until its status is terminal.
pub async fn wait_for_terminal(app: &Router, uri: &str) -> serde_json::Value {
    for _ in 0..200 {
        let json = body_json(get(app.clone(), uri).await).await;
        let status = json["data"]["status"].as_str().unwrap_or_default().to_string();
        if matches!(status.as_str(), "completed" | "completed_with_errors" | "failed") {
            return json;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job at {uri} never reached a terminal status");
}
