//! Generation job registry.
//!
//! Tracks asynchronous multi-scene generation requests (story image sets
//! and videos) from creation to a terminal state. Results arrive either
//! from a direct image engine polled by a background task, or from a
//! workflow engine that reports back through a callback. Both paths
//! funnel through [`JobRegistry::advance`].

pub mod callback;
pub mod config;
pub mod direct;
pub mod delegated;
pub mod dispatcher;
pub mod driver;
pub mod engine;
pub mod engines;
pub mod error;
pub mod job;
pub mod registry;

pub use config::{DelegatedConfig, DirectConfig, RegistryConfig};
pub use dispatcher::JobDispatcher;
pub use driver::CompletionDriver;
pub use engine::{BatchAck, BatchRequest, EngineError, ImageEngine, ImageRequest, WorkflowEngine};
pub use error::JobError;
pub use job::{
    Advance, EngineMode, GenerationJob, IgnoreReason, JobKind, JobStatus, SceneError,
    SceneErrorKind, SceneInput, SceneOutcome, SceneTask,
};
pub use registry::JobRegistry;
