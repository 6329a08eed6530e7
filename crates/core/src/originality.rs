//! Originality scoring for a child's idea and the story generated from it.
//!
//! Scores live in the `60..=100` band. The local heuristic is used when no
//! language model is configured or the model call fails.

use std::collections::HashSet;
use std::sync::LazyLock;

use rand::Rng;
use regex::Regex;

pub const MIN_SCORE: i32 = 60;
pub const MAX_SCORE: i32 = 100;

/// Score used when a model reply contains no integer.
pub const DEFAULT_SCORE: i32 = 75;

const EMOTIONAL_WORDS: &[&str] = &[
    "爱", "友谊", "勇敢", "梦想", "希望", "快乐", "温暖", "感动", "love", "dream", "hope", "happy",
    "friend", "brave",
];

const CREATIVE_WORDS: &[&str] = &[
    "机器人", "魔法", "太空", "发明", "冒险", "变身", "robot", "magic", "space", "invent",
];

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[一-龥a-z]+").expect("valid regex"));

static INTEGER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

/// Clamp any score into the published band.
pub fn clamp_score(score: i32) -> i32 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Parse the first integer of a model reply, defaulting to
/// [`DEFAULT_SCORE`], then clamp it.
pub fn parse_score(reply: &str) -> i32 {
    let raw = INTEGER_RE
        .find(reply)
        .map(|m| saturating_parse(m.as_str()))
        .unwrap_or(DEFAULT_SCORE);
    clamp_score(raw)
}

/// `digits` is a non-empty ASCII digit run, so a parse error means overflow.
fn saturating_parse(digits: &str) -> i32 {
    digits
        .parse::<i64>()
        .map_or(i32::MAX, |n| i32::try_from(n).unwrap_or(i32::MAX))
}

/// Deterministic part of the local heuristic.
pub fn heuristic_score(idea: &str, story: &str) -> i32 {
    let idea_lower = idea.to_lowercase();
    let story_lower = story.to_lowercase();
    let mut score = MIN_SCORE;

    let idea_len = idea.chars().count();
    score += if idea_len > 200 {
        15
    } else if idea_len > 100 {
        10
    } else if idea_len > 50 {
        5
    } else {
        0
    };

    let unique: HashSet<&str> = WORD_RE.find_iter(&idea_lower).map(|m| m.as_str()).collect();
    score += unique.len().min(10) as i32;

    let emotional = EMOTIONAL_WORDS
        .iter()
        .filter(|w| idea_lower.contains(*w) || story_lower.contains(*w))
        .count() as i32;
    score += (emotional * 2).min(10);

    let creative = CREATIVE_WORDS
        .iter()
        .filter(|w| idea_lower.contains(*w))
        .count() as i32;
    score += (creative * 2).min(5);

    score
}

/// Local originality score: the heuristic plus a small random bonus
/// (`0..=5`), clamped.
pub fn local_score(idea: &str, story: &str) -> i32 {
    let bonus = rand::rng().random_range(0..=5);
    clamp_score(heuristic_score(idea, story) + bonus)
}
