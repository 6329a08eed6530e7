//! Storyboard types and the helpers that turn plain story text into scenes.
//!
//! A storyboard is the narrative text plus an ordered list of scenes, each
//! carrying a short visual prompt (CLIP-L) and an optional detailed prompt
//! (T5-XXL) for the image engine.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum number of scenes derived from free-form story text.
pub const MAX_DERIVED_SCENES: usize = 6;

/// Upper bound on the characters kept in a derived short prompt.
const SHORT_PROMPT_MAX_CHARS: usize = 200;

/// Prefix applied to every derived short prompt.
const ILLUSTRATION_STYLE: &str = "A vibrant children's book illustration in a modern cartoon style";

/// Keyword pattern: CJK runs of two or more characters, or Latin words of
/// three or more letters.
static KEYWORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[一-龥]{2,}|[a-zA-Z]{3,}").expect("valid regex"));

/// One scene of a storyboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryScene {
    /// Caller-visible scene number (1-based), when the generator supplied one.
    #[serde(default)]
    pub id: Option<i64>,
    /// Narrative text for this scene.
    #[serde(default)]
    pub story: String,
    /// Short visual prompt.
    #[serde(default, alias = "imagePrompt")]
    pub image_prompt: String,
    /// Detailed visual prompt.
    #[serde(default, alias = "imagePromptDetailed")]
    pub image_prompt_detailed: Option<String>,
}

/// Generated story text and its scene breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storyboard {
    pub story: String,
    #[serde(default)]
    pub scenes: Vec<StoryScene>,
}

impl Storyboard {
    /// Build a storyboard from plain story text, deriving scenes from its
    /// paragraphs.
    pub fn from_story_text(story: impl Into<String>) -> Self {
        let story = story.into();
        let scenes = split_into_scenes(&story, MAX_DERIVED_SCENES);
        Self { story, scenes }
    }

    /// Assign 1-based ids to scenes that arrived without one.
    pub fn number_scenes(&mut self) {
        for (index, scene) in self.scenes.iter_mut().enumerate() {
            if scene.id.is_none() {
                scene.id = Some(index as i64 + 1);
            }
        }
    }
}

/// Split story text into at most `max_scenes` scenes.
///
/// Paragraphs are separated by blank lines (or single newlines when the
/// text has no blank lines). Surplus paragraphs are merged into the last
/// scene so no narrative text is lost.
pub fn split_into_scenes(story: &str, max_scenes: usize) -> Vec<StoryScene> {
    if max_scenes == 0 {
        return Vec::new();
    }

    let separator = if story.contains("\n\n") { "\n\n" } else { "\n" };
    let mut paragraphs: Vec<String> = story
        .split(separator)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    if paragraphs.len() > max_scenes {
        let tail = paragraphs.split_off(max_scenes - 1).join("\n");
        paragraphs.push(tail);
    }

    paragraphs
        .into_iter()
        .enumerate()
        .map(|(index, paragraph)| StoryScene {
            id: Some(index as i64 + 1),
            image_prompt: short_prompt(&paragraph),
            image_prompt_detailed: Some(paragraph.clone()),
            story: paragraph,
        })
        .collect()
}

/// Derive a short visual prompt from a paragraph: the style prefix plus the
/// first sentence, capped at [`SHORT_PROMPT_MAX_CHARS`] characters.
pub fn short_prompt(paragraph: &str) -> String {
    let first_sentence = paragraph
        .split(['.', '!', '?', '。', '！', '？'])
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("");
    let prompt = format!("{ILLUSTRATION_STYLE}. {first_sentence}");
    truncate_chars(&prompt, SHORT_PROMPT_MAX_CHARS)
}

/// Extract up to three keywords from free-form text.
pub fn extract_keywords(text: &str) -> Vec<String> {
    KEYWORD_RE
        .find_iter(text)
        .take(3)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Strip a Markdown code fence (```` ``` ```` or ```` ```json ````) wrapping
/// a model reply.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
