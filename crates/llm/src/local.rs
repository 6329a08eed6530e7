//! Template story generator used without a language model.

use rand::seq::IndexedRandom;
use writetalent_core::storyboard::{extract_keywords, truncate_chars};
use writetalent_core::themes::{
    THEME_CREATION_EXPLORATION, THEME_EMOTIONS_RELATIONSHIPS, THEME_EVERYDAY_LIFE,
    THEME_FANTASY_ADVENTURE, THEME_SELF_GROWTH, THEME_SOCIETY_WORLD,
};

const IDEA_EXCERPT_CHARS: usize = 100;

fn theme_openings(theme: &str) -> &'static [&'static str] {
    match theme {
        THEME_FANTASY_ADVENTURE => &[
            "In a world full of magic",
            "In a faraway enchanted kingdom",
            "On a night of twinkling stars",
        ],
        THEME_CREATION_EXPLORATION => &[
            "In a little town full of ideas",
            "In a corner of a busy science lab",
            "In an inventor's cluttered workshop",
        ],
        THEME_EMOTIONS_RELATIONSHIPS => &[
            "Under the warm afternoon sun",
            "In a home full of love",
            "In a garden where friendships grow",
        ],
        THEME_SELF_GROWTH => &[
            "On the road to growing up",
            "On an ordinary yet special day",
            "At the moment a challenge appeared",
        ],
        THEME_SOCIETY_WORLD => &[
            "In the wide world we share",
            "In a beautiful little town",
            "At the heart of the neighbourhood",
        ],
        THEME_EVERYDAY_LIFE => &["On an ordinary day", "Right beside us", "In the middle of daily life"],
        _ => &["Once upon a time"],
    }
}

/// Compose a story from the child's idea and a theme-flavoured opening.
pub fn generate_local_story(theme: &str, idea: &str) -> String {
    let opening = theme_openings(theme)
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or("Once upon a time");
    let hero = extract_keywords(idea)
        .into_iter()
        .next()
        .unwrap_or_else(|| "a very special hero".to_string());

    let idea = idea.trim();
    let mut excerpt = truncate_chars(idea, IDEA_EXCERPT_CHARS);
    if idea.chars().count() > IDEA_EXCERPT_CHARS {
        excerpt.push_str("...");
    }

    format!(
        "{opening}, a story about {hero} was quietly beginning.

{excerpt}

The idea was like a seed, slowly sprouting. From a tiny thought to a clear \
dream, every step was full of surprises and challenges.

Along the way there were many wonderful companions. Some were brave, some \
were kind and some were wise. They laughed together and faced hard times \
together, and when trouble came they did not give up but cheered each other \
on and searched for an answer.

At last, thanks to everyone's effort, the dream came true. In that moment \
the sky seemed to burst into fireworks and every face lit up with joy.

This story reminds us that every idea is a precious treasure. With courage \
and care, any dream can blossom.

And the end of this story is a brand new beginning, because inside every \
child there are endless possibilities waiting to be discovered and shared \
with the world."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_contains_idea_and_keyword_hero() {
        let story = generate_local_story(THEME_FANTASY_ADVENTURE, "dragon who bakes bread");
        assert!(story.contains("a story about dragon"));
        assert!(story.contains("dragon who bakes bread"));
    }

    #[test]
    fn long_idea_is_abbreviated() {
        let idea = "a".repeat(150);
        let story = generate_local_story("unknown-theme", &idea);
        assert!(story.starts_with("Once upon a time"));
        assert!(story.contains(&format!("{}...", "a".repeat(IDEA_EXCERPT_CHARS))));
    }

    #[test]
    fn idea_without_keywords_gets_default_hero() {
        let story = generate_local_story(THEME_EVERYDAY_LIFE, "!! ??");
        assert!(story.contains("a very special hero"));
    }
}
