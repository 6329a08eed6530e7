//! ComfyUI REST client library.
//!
//! Provides the Flux text-to-image workflow template, HTTP API wrappers
//! for prompt submission and history lookup, and typed history parsing
//! for locating generated images on a ComfyUI image-generation server.

pub mod api;
pub mod config;
pub mod history;
pub mod workflow;
