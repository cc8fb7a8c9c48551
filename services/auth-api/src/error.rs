//! Error types for the Auth API service.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyward_auth_core::AuthError;
use serde::Serialize;

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// API error type
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No bearer token provided")]
    MissingToken,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "UNAUTHORIZED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Auth(e) => e.public_code(),
        }
    }

    /// Message safe to show a client
    fn public_message(&self) -> String {
        match self {
            Self::MissingToken => "Invalid or expired token".to_string(),
            Self::Auth(e) if e.is_unauthenticated() => "Invalid or expired token".to_string(),
            Self::Auth(AuthError::StorageUnavailable(_)) => {
                "Service temporarily unavailable".to_string()
            }
            Self::Auth(AuthError::Signing(_) | AuthError::Configuration(_)) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Self::Auth(e) if status.is_server_error() => {
                tracing::error!(error = %e, code = e.error_code(), "Internal API error");
            }
            Self::Auth(e) => {
                tracing::debug!(code = e.error_code(), "Request rejected");
            }
            _ => {}
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.public_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn body(err: ApiError) -> (StatusCode, String, String) {
        let status = err.status_code();
        (status, err.error_code().to_string(), err.public_message())
    }

    #[test]
    fn test_token_failures_are_identical() {
        let expected = body(ApiError::MissingToken);
        for err in [
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::MalformedClaims,
            AuthError::StaleToken,
            AuthError::SessionNotFound,
        ] {
            assert_eq!(body(ApiError::Auth(err)), expected);
        }
        assert_eq!(expected.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_storage_failure_is_503_without_detail() {
        let (status, code, message) =
            body(ApiError::Auth(AuthError::StorageUnavailable("pool timed out".into())));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "STORAGE_UNAVAILABLE");
        assert!(!message.contains("pool"));
    }

    #[test]
    fn test_conflict_and_input_errors() {
        assert_eq!(
            ApiError::Auth(AuthError::PrincipalExists).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Auth(AuthError::InvalidInput("email is required".into())).public_message(),
            "invalid input: email is required"
        );
    }
}
