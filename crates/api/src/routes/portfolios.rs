//! Route definitions for the `/portfolios` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::portfolios;
use crate::state::AppState;

/// Routes mounted at `/portfolios`.
///
/// ```text
/// GET  /      -> list
/// POST /      -> create
/// GET  /{id}  -> get_by_id
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(portfolios::list).post(portfolios::create))
        .route("/{id}", get(portfolios::get_by_id))
}
