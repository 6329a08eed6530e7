//! Text-generation collaborator.
//!
//! Turns a child's idea and theme into a storyboard and scores the
//! originality of the result. A DeepSeek (OpenAI-compatible) model is used
//! when an API key is configured; otherwise a local template generator and
//! heuristic scorer stand in.

pub mod client;
pub mod config;
pub mod error;
pub mod local;
pub mod prompts;
pub mod storyteller;

pub use config::LlmConfig;
pub use error::LlmError;
pub use storyteller::{storyteller_from_config, LocalStoryteller, RemoteStoryteller, Storyteller};
