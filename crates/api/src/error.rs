use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use writetalent_core::error::CoreError;
use writetalent_pipeline::JobError;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Every handler failure ends up here and leaves as `{"error", "code"}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Story generation provider failed. Detail is logged, never returned.
    #[error("Upstream generation failed: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type AppResult<T> = Result<T, AppError>;

type Parts = (StatusCode, &'static str, String);

impl AppError {
    fn parts(&self) -> Parts {
        match self {
            AppError::Core(CoreError::NotFound { entity, id }) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{entity} with id {id} not found"),
            ),
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::Core(CoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Core(CoreError::Internal(msg)) | AppError::InternalError(msg) => {
                internal(msg)
            }
            AppError::Job(job) => job_parts(job),
            AppError::Database(err) => database_parts(err),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!(error = %msg, "Story provider failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    "Failed to generate story. Please try again.".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();
        (status, axum::Json(json!({ "error": message, "code": code }))).into_response()
    }
}

fn job_parts(job: &JobError) -> Parts {
    match job {
        JobError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
        JobError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Generation job with id {id} not found"),
        ),
        JobError::SubmissionFailure(msg) => {
            tracing::warn!(error = %msg, "Job submission failed");
            (StatusCode::BAD_GATEWAY, "GENERATION_FAILED", job.to_string())
        }
        JobError::CallbackMismatch { .. } => (StatusCode::CONFLICT, "CONFLICT", job.to_string()),
    }
}

fn internal(msg: &str) -> Parts {
    tracing::error!(error = %msg, "Internal error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}

/// `RowNotFound` is a 404 and a Postgres unique violation (23505) on a
/// `uq_`-prefixed constraint is a 409. Anything else is logged and hidden.
fn database_parts(err: &sqlx::Error) -> Parts {
    if matches!(err, sqlx::Error::RowNotFound) {
        return (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "Resource not found".to_string(),
        );
    }

    if let sqlx::Error::Database(db_err) = err {
        let unique_violation = db_err.code().as_deref() == Some("23505");
        if let Some(constraint) = db_err.constraint().filter(|c| unique_violation && c.starts_with("uq_")) {
            return (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Duplicate value violates unique constraint: {constraint}"),
            );
        }
    }

    tracing::error!(error = %err, "Database error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        INTERNAL_MESSAGE.to_string(),
    )
}
