//! Token handoff collection

use axum::extract::{Path, State};
use axum::Json;
use keyward_types::{HandoffId, HandoffTokens};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/v1/key/token/{id}
///
/// Hands a parked token pair to the app's callback. Each id works once.
pub async fn collect_tokens(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HandoffTokens>> {
    let id = HandoffId::parse(&id).map_err(|_| ApiError::BadRequest("invalid token id".into()))?;
    Ok(Json(state.handoff.collect(id).await?))
}
