//! The [`Storyteller`] seam used by the HTTP layer.

use std::sync::Arc;

use async_trait::async_trait;
use writetalent_core::originality::{local_score, parse_score};
use writetalent_core::storyboard::{short_prompt, strip_code_fence, Storyboard};

use crate::client::{ChatMessage, DeepSeekClient, Sampling};
use crate::config::LlmConfig;
use crate::error::LlmError;
use crate::local::generate_local_story;
use crate::prompts::{originality_prompt, storyboard_prompt, STORY_WRITER_SYSTEM_PROMPT};

const STORY_SAMPLING: Sampling = Sampling {
    temperature: 0.8,
    max_tokens: 2500,
};

const SCORING_SAMPLING: Sampling = Sampling {
    temperature: 0.3,
    max_tokens: 20,
};

/// Generates storyboards and scores their originality.
#[async_trait]
pub trait Storyteller: Send + Sync {
    /// Short provider name reported in response metadata.
    fn provider(&self) -> &'static str;

    /// Expand a child's idea into a story with scenes.
    async fn generate_storyboard(&self, theme: &str, idea: &str) -> Result<Storyboard, LlmError>;

    /// Originality score in `60..=100`. Never fails; falls back to local
    /// scoring.
    async fn score_originality(&self, idea: &str, story: &str) -> i32;
}

/// Pick the remote storyteller when an API key is configured.
pub fn storyteller_from_config(config: &LlmConfig) -> Result<Arc<dyn Storyteller>, LlmError> {
    Ok(match DeepSeekClient::from_config(config)? {
        Some(client) => Arc::new(RemoteStoryteller::new(client)),
        None => {
            tracing::warn!("DEEPSEEK_API_KEY not configured, using local story generation");
            Arc::new(LocalStoryteller)
        }
    })
}

/// Storyteller backed by the DeepSeek completion API.
pub struct RemoteStoryteller {
    client: DeepSeekClient,
}

impl RemoteStoryteller {
    pub fn new(client: DeepSeekClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Storyteller for RemoteStoryteller {
    fn provider(&self) -> &'static str {
        "deepseek"
    }

    async fn generate_storyboard(&self, theme: &str, idea: &str) -> Result<Storyboard, LlmError> {
        let messages = [
            ChatMessage::system(STORY_WRITER_SYSTEM_PROMPT),
            ChatMessage::user(storyboard_prompt(theme, idea)),
        ];
        let reply = self.client.complete(&messages, STORY_SAMPLING).await?;
        let storyboard = parse_storyboard(&reply);
        tracing::info!(
            theme,
            scene_count = storyboard.scenes.len(),
            "Storyboard generated"
        );
        Ok(storyboard)
    }

    async fn score_originality(&self, idea: &str, story: &str) -> i32 {
        let messages = [ChatMessage::user(originality_prompt(idea, story))];
        match self.client.complete(&messages, SCORING_SAMPLING).await {
            Ok(reply) => parse_score(&reply),
            Err(e) => {
                tracing::warn!(error = %e, "Originality scoring failed, using local score");
                local_score(idea, story)
            }
        }
    }
}

/// Storyteller that never leaves the process.
pub struct LocalStoryteller;

#[async_trait]
impl Storyteller for LocalStoryteller {
    fn provider(&self) -> &'static str {
        "local"
    }

    async fn generate_storyboard(&self, theme: &str, idea: &str) -> Result<Storyboard, LlmError> {
        Ok(Storyboard::from_story_text(generate_local_story(theme, idea)))
    }

    async fn score_originality(&self, idea: &str, story: &str) -> i32 {
        local_score(idea, story)
    }
}

/// Interpret a model reply as a JSON storyboard, falling back to treating
/// it as plain story text.
pub fn parse_storyboard(reply: &str) -> Storyboard {
    let body = strip_code_fence(reply);
    match serde_json::from_str::<Storyboard>(body) {
        Ok(mut storyboard) if !storyboard.story.trim().is_empty() => {
            storyboard.story = storyboard.story.trim().to_string();
            storyboard.scenes.retain(|scene| {
                !scene.story.trim().is_empty() || !scene.image_prompt.trim().is_empty()
            });
            if storyboard.scenes.is_empty() {
                return Storyboard::from_story_text(storyboard.story);
            }
            for scene in &mut storyboard.scenes {
                if scene.image_prompt.trim().is_empty() {
                    scene.image_prompt = short_prompt(&scene.story);
                }
            }
            storyboard.number_scenes();
            storyboard
        }
        _ => Storyboard::from_story_text(body),
    }
}
