//! Handlers for the `/portfolios` resource (the published feed).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use writetalent_core::error::CoreError;
use writetalent_core::originality::{clamp_score, DEFAULT_SCORE};
use writetalent_core::types::DbId;
use writetalent_db::models::portfolio::{CreatePortfolio, Portfolio, PortfolioWithCreator};
use writetalent_db::repositories::{PortfolioRepo, UserRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/portfolios
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<PortfolioWithCreator>>>> {
    let portfolios = PortfolioRepo::list_published(&state.pool).await?;
    Ok(Json(DataResponse { data: portfolios }))
}

/// GET /api/v1/portfolios/{id}
///
/// Counts as a view.
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<PortfolioWithCreator>>> {
    let mut portfolio = PortfolioRepo::find_published_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("Portfolio", id))?;

    PortfolioRepo::increment_views(&state.pool, id).await?;
    portfolio.portfolio.views_count += 1;

    Ok(Json(DataResponse { data: portfolio }))
}

/// POST /api/v1/portfolios
///
/// Publishes immediately. The originality score is clamped into 60..=100.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePortfolio>,
) -> AppResult<(StatusCode, Json<DataResponse<Portfolio>>)> {
    let required = [
        ("title", &input.title),
        ("theme", &input.theme),
        ("original_idea", &input.original_idea),
        ("story", &input.story),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    if UserRepo::find_by_id(&state.pool, input.user_id).await?.is_none() {
        return Err(CoreError::not_found("User", input.user_id).into());
    }

    let score = clamp_score(input.originality_score.unwrap_or(DEFAULT_SCORE));
    let portfolio = PortfolioRepo::create_published(&state.pool, &input, score).await?;

    tracing::info!(portfolio_id = portfolio.id, user_id = portfolio.user_id, "Portfolio published");
    Ok((StatusCode::CREATED, Json(DataResponse { data: portfolio })))
}
