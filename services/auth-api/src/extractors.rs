//! Axum extractors for authentication

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::header;
use axum::http::request::Parts;
use keyward_auth_core::AccessClaims;
use keyward_types::PrincipalId;

use crate::error::ApiError;
use crate::state::AppState;

/// Principal authenticated by a bearer access token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub principal_id: PrincipalId,
    pub claims: AccessClaims,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(ApiError::MissingToken)?;
        let claims = state.auth.verify_access(token)?;

        Ok(AuthUser {
            principal_id: claims.principal_id,
            claims,
        })
    }
}

/// JSON body whose rejection uses the API error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Token from `Authorization: Bearer <token>`
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}
