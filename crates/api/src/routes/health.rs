use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when Postgres does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Generation jobs currently held in memory, finished ones included.
    pub tracked_jobs: usize,
    pub delegated_engine: bool,
}

/// GET /health
async fn report(State(state): State<AppState>) -> Json<HealthReport> {
    let db_healthy = match writetalent_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health probe failed");
            false
        }
    };

    Json(HealthReport {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        tracked_jobs: state.dispatcher.registry().len().await,
        delegated_engine: state.dispatcher.has_delegated(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(report))
}
