//! Handlers for the `/users` resource.

use axum::extract::{Path, State};
use axum::Json;
use writetalent_core::error::CoreError;
use writetalent_core::types::DbId;
use writetalent_db::models::user::UserResponse;
use writetalent_db::repositories::UserRepo;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::not_found("User", id))?;
    Ok(Json(DataResponse {
        data: UserResponse::from(user),
    }))
}
