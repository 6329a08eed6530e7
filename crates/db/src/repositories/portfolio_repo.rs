//! Repository for the `portfolios` table.

use sqlx::PgPool;
use writetalent_core::types::DbId;

use crate::models::portfolio::{
    CreatePortfolio, Portfolio, PortfolioWithCreator, PORTFOLIO_STATUS_PUBLISHED,
};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, title, theme, original_idea, story, storybook, music_url, \
                        video_url, video_metadata, originality_score, likes_count, views_count, \
                        rating, status, published_at, created_at, updated_at";

/// Portfolio columns qualified with the `p` alias plus the creator fields.
const JOINED_COLUMNS: &str = "p.id, p.user_id, p.title, p.theme, p.original_idea, p.story, \
                               p.storybook, p.music_url, p.video_url, p.video_metadata, \
                               p.originality_score, p.likes_count, p.views_count, p.rating, \
                               p.status, p.published_at, p.created_at, p.updated_at, \
                               u.username AS creator_name, u.age AS creator_age, \
                               u.avatar AS creator_avatar";

/// Provides feed queries and publishing for portfolios.
pub struct PortfolioRepo;

impl PortfolioRepo {
    /// Publish a new portfolio and bump the creator's `works_count` in one
    /// transaction.
    ///
    /// `originality_score` must already be clamped by the caller.
    pub async fn create_published(
        pool: &PgPool,
        input: &CreatePortfolio,
        originality_score: i32,
    ) -> Result<Portfolio, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO portfolios \
                (user_id, title, theme, original_idea, story, storybook, music_url, video_url, \
                 originality_score, status, published_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW()) \
             RETURNING {COLUMNS}"
        );
        let portfolio = sqlx::query_as::<_, Portfolio>(&query)
            .bind(input.user_id)
            .bind(&input.title)
            .bind(&input.theme)
            .bind(&input.original_idea)
            .bind(&input.story)
            .bind(&input.storybook)
            .bind(&input.music_url)
            .bind(&input.video_url)
            .bind(originality_score)
            .bind(PORTFOLIO_STATUS_PUBLISHED)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE users SET works_count = works_count + 1, updated_at = NOW() WHERE id = $1",
        )
        .bind(input.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(portfolio)
    }

    /// List published portfolios with creator details, newest first.
    pub async fn list_published(pool: &PgPool) -> Result<Vec<PortfolioWithCreator>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM portfolios p \
             LEFT JOIN users u ON p.user_id = u.id \
             WHERE p.status = $1 \
             ORDER BY p.created_at DESC, p.id DESC"
        );
        sqlx::query_as::<_, PortfolioWithCreator>(&query)
            .bind(PORTFOLIO_STATUS_PUBLISHED)
            .fetch_all(pool)
            .await
    }

    /// Find a published portfolio with creator details.
    pub async fn find_published_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<PortfolioWithCreator>, sqlx::Error> {
        let query = format!(
            "SELECT {JOINED_COLUMNS} FROM portfolios p \
             LEFT JOIN users u ON p.user_id = u.id \
             WHERE p.id = $1 AND p.status = $2"
        );
        sqlx::query_as::<_, PortfolioWithCreator>(&query)
            .bind(id)
            .bind(PORTFOLIO_STATUS_PUBLISHED)
            .fetch_optional(pool)
            .await
    }

    /// Increment the view counter by 1.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE portfolios SET views_count = views_count + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
