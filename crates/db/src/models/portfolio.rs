//! Portfolio entity model and DTOs.
//!
//! A portfolio is a published storybook: the child's original idea, the
//! generated story, media URLs and engagement counters.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use writetalent_core::types::{DbId, Timestamp};

/// Portfolio visible in the social feed.
pub const PORTFOLIO_STATUS_PUBLISHED: &str = "published";

/// A row from the `portfolios` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Portfolio {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub theme: String,
    pub original_idea: String,
    pub story: String,
    pub storybook: Option<serde_json::Value>,
    pub music_url: Option<String>,
    pub video_url: Option<String>,
    pub video_metadata: Option<serde_json::Value>,
    pub originality_score: i32,
    pub likes_count: i32,
    pub views_count: i32,
    pub rating: f64,
    pub status: String,
    pub published_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A portfolio joined with its creator's public profile fields.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PortfolioWithCreator {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub portfolio: Portfolio,
    pub creator_name: Option<String>,
    pub creator_age: Option<i32>,
    pub creator_avatar: Option<String>,
}

/// DTO for publishing a new portfolio.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePortfolio {
    pub user_id: DbId,
    pub title: String,
    pub theme: String,
    pub original_idea: String,
    pub story: String,
    pub storybook: Option<serde_json::Value>,
    pub music_url: Option<String>,
    pub video_url: Option<String>,
    /// Clamped into the published band by the handler before insert.
    pub originality_score: Option<i32>,
}
