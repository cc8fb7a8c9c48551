//! Public key distribution

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use crate::state::AppState;

/// GET /api/v1/key/public
///
/// PEM public key for verifying access tokens offline
pub async fn public_key(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", state.auth.public_key_pem()),
    )
}
