//! Client for the n8n workflow-automation engine.
//!
//! Story images and the final video are produced by n8n workflows that
//! are started through webhooks and report back by POSTing to a callback
//! URL. This crate owns the wire format in both directions.

pub mod callback;
pub mod client;
pub mod config;
pub mod payload;

pub use callback::{CallbackImage, CallbackPayload};
pub use client::{N8nClient, N8nError, WebhookAck};
pub use config::N8nConfig;
pub use payload::{ImageBatchPayload, ImageBatchScene, VideoBatchPayload, VideoBatchScene};
