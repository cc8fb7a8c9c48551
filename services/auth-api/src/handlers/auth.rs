//! Authentication handlers (signup, login, refresh, logout, me)

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use keyward_auth_core::{Authenticated, Signup};
use keyward_types::{
    ActiveSession, AppId, AuthProvider, HandoffId, Principal, PrincipalId, TokenPair,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{ApiJson, AuthUser};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    /// Client application to open a session for
    pub app_id: Option<AppId>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Client application to open a session for; stateless tokens without it
    pub app_id: Option<AppId>,
}

#[derive(Debug, Deserialize)]
pub struct ExternalLoginRequest {
    pub provider: AuthProvider,
    /// Provider-issued credential, checked by the configured verifier
    pub credential: String,
    pub app_id: Option<AppId>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
    pub principal_id: PrincipalId,
    pub app_id: AppId,
}

#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub app_id: AppId,
}

#[derive(Debug, Serialize)]
pub struct PrincipalInfo {
    pub id: PrincipalId,
    pub name: String,
    pub email: String,
}

impl From<Principal> for PrincipalInfo {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            name: principal.name,
            email: principal.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub principal: PrincipalInfo,
    #[serde(flatten)]
    pub tokens: TokenPair,
    /// Present when logging into an app; the app collects the pair with it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<HandoffId>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub principal: PrincipalInfo,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<ActiveSession>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/signup
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let signup = Signup {
        name: req.name,
        email: req.email,
        password: req.password,
    };
    let auth = state.auth.signup(signup, req.app_id).await?;
    let response = respond(&state, auth, req.app_id).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/login
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let auth = state.auth.login(&req.email, &req.password, req.app_id).await?;
    Ok(Json(respond(&state, auth, req.app_id).await?))
}

/// POST /api/v1/login/external
///
/// Log in with a credential from an external identity provider
pub async fn login_external(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ExternalLoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let identity = state.verifier.verify(req.provider, &req.credential).await?;
    let auth = state.auth.login_external(identity, req.app_id).await?;
    Ok(Json(respond(&state, auth, req.app_id).await?))
}

/// POST /api/v1/refresh
///
/// Exchange the session's live refresh token for a new pair
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = state
        .auth
        .refresh(&req.refresh_token, req.principal_id, req.app_id)
        .await?;
    Ok(Json(tokens))
}

/// POST /api/v1/logout
///
/// End the caller's session for one app
pub async fn logout(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ApiJson(req): ApiJson<LogoutRequest>,
) -> ApiResult<StatusCode> {
    state.auth.logout(auth_user.principal_id, req.app_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/me
pub async fn me(auth_user: AuthUser) -> Json<MeResponse> {
    let claims = auth_user.claims;
    Json(MeResponse {
        principal: PrincipalInfo {
            id: claims.principal_id,
            name: claims.name,
            email: claims.email,
        },
        expires_at: DateTime::from_timestamp(claims.exp, 0),
    })
}

/// GET /api/v1/sessions
///
/// Apps the caller holds a live session with
pub async fn sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> ApiResult<Json<SessionsResponse>> {
    let sessions = state.auth.active_sessions(auth_user.principal_id).await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// Park the pair for the app's callback when logging into an app
async fn respond(
    state: &AppState,
    auth: Authenticated,
    app_id: Option<AppId>,
) -> ApiResult<AuthResponse> {
    let token_id = match app_id {
        Some(app_id) => Some(
            state
                .handoff
                .deposit(auth.principal.id, app_id, &auth.tokens)
                .await?,
        ),
        None => None,
    };

    Ok(AuthResponse {
        principal: auth.principal.into(),
        tokens: auth.tokens,
        token_id,
    })
}
