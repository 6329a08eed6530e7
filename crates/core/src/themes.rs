//! Story theme catalogue.
//!
//! The theme tag travels from the story wizard into the storyboard prompt and
//! is stored on the published portfolio.

pub const THEME_FANTASY_ADVENTURE: &str = "fantasy-adventure";
pub const THEME_CREATION_EXPLORATION: &str = "creation-exploration";
pub const THEME_EMOTIONS_RELATIONSHIPS: &str = "emotions-relationships";
pub const THEME_SELF_GROWTH: &str = "self-growth";
pub const THEME_SOCIETY_WORLD: &str = "society-world";
pub const THEME_EVERYDAY_LIFE: &str = "everyday-life";

/// All theme tags offered by the story wizard.
pub const VALID_THEMES: &[&str] = &[
    THEME_FANTASY_ADVENTURE,
    THEME_CREATION_EXPLORATION,
    THEME_EMOTIONS_RELATIONSHIPS,
    THEME_SELF_GROWTH,
    THEME_SOCIETY_WORLD,
    THEME_EVERYDAY_LIFE,
];
