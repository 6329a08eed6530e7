//! Prompt text sent to the completion model.

use writetalent_core::storyboard::truncate_chars;
use writetalent_core::themes::{
    THEME_CREATION_EXPLORATION, THEME_EMOTIONS_RELATIONSHIPS, THEME_EVERYDAY_LIFE,
    THEME_FANTASY_ADVENTURE, THEME_SELF_GROWTH, THEME_SOCIETY_WORLD,
};

pub const STORY_WRITER_SYSTEM_PROMPT: &str = "\
You are a celebrated children's author with a warm, imaginative voice.

You turn a child's scattered ideas into a complete story for readers aged 7 to 14:
- Keep the core of the child's idea; do not replace it with your own.
- Use simple, vivid language that paints clear pictures.
- Carry positive values such as friendship, courage, love and growth.
- Be imaginative while keeping the story internally consistent.
- Aim for 400 to 600 words, about two or three minutes of reading.

Structure: an inviting opening that sets the scene and the hero, a challenge \
that starts the adventure, a turning point where the problem is solved, and \
a warm ending with a gentle message.";

const GENERIC_THEME_PROMPT: &str = "Write a warm and charming children's story.";

/// Theme-specific instruction; unknown themes get a generic one.
pub fn theme_prompt(theme: &str) -> &'static str {
    match theme {
        THEME_FANTASY_ADVENTURE => "This is a story full of magic and adventure. Write a fantasy adventure.",
        THEME_CREATION_EXPLORATION => "This is a story about creating and exploring. Write a story full of invention and curiosity.",
        THEME_EMOTIONS_RELATIONSHIPS => "This is a story about feelings and relationships. Write a heart-warming story.",
        THEME_SELF_GROWTH => "This is a story about growing up. Write an encouraging story of personal growth.",
        THEME_SOCIETY_WORLD => "This is a story about society and the wider world. Write a story that opens the reader's eyes.",
        THEME_EVERYDAY_LIFE => "This is a story about everyday life. Write a warm story close to a child's daily world.",
        _ => GENERIC_THEME_PROMPT,
    }
}

/// User prompt asking for a JSON storyboard.
pub fn storyboard_prompt(theme: &str, idea: &str) -> String {
    format!(
        "{theme_prompt}

The child's idea: {idea}

Write a complete story based on this idea that keeps its core, flows \
naturally, reads well aloud and carries a positive message. Then split it \
into 3 to 6 scenes for illustration.

Reply with JSON only, no commentary, in exactly this shape:
{{\"story\": \"<full story>\", \"scenes\": [{{\"story\": \"<scene text>\", \
\"imagePrompt\": \"<one-sentence English visual description>\", \
\"imagePromptDetailed\": \"<detailed English visual description: characters, \
setting, lighting, mood>\"}}]}}",
        theme_prompt = theme_prompt(theme),
    )
}

/// Prompt asking for a single integer originality score.
pub fn originality_prompt(idea: &str, story: &str) -> String {
    format!(
        "You are an expert judge of originality in children's stories.

Rate the originality of this story out of 100 using these criteria:
1. Novelty of the core idea (30)
2. Unexpected plot development (25)
3. Distinctive characters (20)
4. Creative use of language (15)
5. Depth of theme (10)

Guide: 90-100 strikingly original; 80-89 fresh and distinctive; 70-79 some \
creativity with familiar elements; 60-69 ordinary.

Original idea: {idea}

Generated story: {excerpt}...

Reply with a single integer between 60 and 100 and nothing else.",
        excerpt = truncate_chars(story, 500),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_theme_has_its_own_prompt() {
        for theme in writetalent_core::themes::VALID_THEMES {
            assert_ne!(theme_prompt(theme), GENERIC_THEME_PROMPT, "{theme}");
        }
        assert_eq!(theme_prompt("space-opera"), GENERIC_THEME_PROMPT);
    }

    #[test]
    fn storyboard_prompt_embeds_idea_and_shape() {
        let prompt = storyboard_prompt(THEME_SELF_GROWTH, "a turtle learns to swim");
        assert!(prompt.contains("a turtle learns to swim"));
        assert!(prompt.contains("\"imagePromptDetailed\""));
    }
}
