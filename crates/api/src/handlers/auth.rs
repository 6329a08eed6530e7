//! Handlers for the `/auth` resource (registration and password reset).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use writetalent_core::error::CoreError;
use writetalent_core::verification::CODE_TTL_MINUTES;
use writetalent_db::models::user::{
    default_avatar_url, CreateUser, UserResponse, USER_TYPE_CHILD, VALID_USER_TYPES,
};
use writetalent_db::repositories::UserRepo;

use crate::auth::password::{hash_password, validate_password_strength, MIN_PASSWORD_LENGTH};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
///
/// Fields are optional at the type level so that a missing field is a 400
/// with a readable message rather than an extractor rejection.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    /// `child` (default) or `parent`.
    #[serde(rename = "type")]
    pub user_type: Option<String>,
    pub age: Option<i32>,
}

/// Request body for `POST /auth/send-verification-code`.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub email: Option<String>,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: Option<String>,
    pub code: Option<String>,
    #[serde(alias = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub message: String,
    pub expires_in_secs: i64,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UserResponse>>)> {
    let (Some(username), Some(email), Some(password)) = (
        present(input.username),
        present(input.email),
        input.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Missing required fields: username, email, password".into(),
        ));
    };

    let user_type = present(input.user_type).unwrap_or_else(|| USER_TYPE_CHILD.to_string());
    if !VALID_USER_TYPES.contains(&user_type.as_str()) {
        return Err(AppError::BadRequest(format!(
            "Invalid user type '{user_type}', expected one of: {}",
            VALID_USER_TYPES.join(", ")
        )));
    }

    if let Some(age) = input.age.filter(|age| *age <= 0) {
        return Err(AppError::BadRequest(format!(
            "Age must be a positive number, got {age}"
        )));
    }

    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "Email already exists, please choose another.".into(),
        )));
    }

    let password_hash =
        hash_password(&password).map_err(|e| AppError::InternalError(e.to_string()))?;

    let avatar = Some(default_avatar_url(&username));
    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            username,
            email,
            password_hash,
            user_type,
            age: input.age,
            avatar,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: UserResponse::from(user),
        }),
    ))
}

/// POST /api/v1/auth/send-verification-code
///
/// Issues a five-digit code. It is emailed when SMTP is configured and
/// logged otherwise.
pub async fn send_verification_code(
    State(state): State<AppState>,
    Json(input): Json<SendCodeRequest>,
) -> AppResult<Json<DataResponse<SendCodeResponse>>> {
    let email = present(input.email)
        .ok_or_else(|| AppError::BadRequest("Email is required".into()))?;

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| CoreError::not_found("User", &email))?;

    let code = state.verification_codes.issue(&email, Utc::now()).await;

    match &state.mailer {
        Some(mailer) => {
            if let Err(e) = mailer.send_code(&email, &user.username, &code.code).await {
                state.verification_codes.consume(&email).await;
                return Err(AppError::InternalError(format!(
                    "Failed to send verification code: {e}"
                )));
            }
        }
        None => {
            tracing::info!(
                email = %email,
                code = %code.code,
                "SMTP not configured, verification code not emailed",
            );
        }
    }

    Ok(Json(DataResponse {
        data: SendCodeResponse {
            message: "Verification code sent to your email".into(),
            expires_in_secs: CODE_TTL_MINUTES * 60,
        },
    }))
}

/// POST /api/v1/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let (Some(email), Some(code), Some(new_password)) = (
        present(input.email),
        present(input.code),
        input.new_password.filter(|p| !p.is_empty()),
    ) else {
        return Err(AppError::BadRequest(
            "Email, code, and new password are required".into(),
        ));
    };

    state
        .verification_codes
        .check(&email, &code, Utc::now())
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    validate_password_strength(&new_password, MIN_PASSWORD_LENGTH)
        .map_err(AppError::BadRequest)?;

    let password_hash =
        hash_password(&new_password).map_err(|e| AppError::InternalError(e.to_string()))?;

    if !UserRepo::update_password_by_email(&state.pool, &email, &password_hash).await? {
        return Err(CoreError::not_found("User", &email).into());
    }
    state.verification_codes.consume(&email).await;

    tracing::info!(email = %email, "Password reset");
    Ok(Json(DataResponse {
        data: MessageResponse {
            message: "Password reset successfully".into(),
        },
    }))
}
