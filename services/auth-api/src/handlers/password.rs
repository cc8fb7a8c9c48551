//! Password change and reset handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub status: &'static str,
}

/// POST /api/v1/change-password
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .change_password(auth_user.principal_id, &req.current_password, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/forgot-password
///
/// Answers 202 whether or not the email is known.
pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> (StatusCode, Json<AcceptedResponse>) {
    match state.auth.begin_password_reset(&req.email).await {
        Ok(Some(reset)) => {
            state
                .notifier
                .password_reset_requested(&reset.email, &reset.token)
                .await;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!(error = %e, "Failed to start password reset");
        }
    }

    (
        StatusCode::ACCEPTED,
        Json(AcceptedResponse { status: "accepted" }),
    )
}

/// POST /api/v1/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth
        .complete_password_reset(&req.email, &req.token, &req.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
