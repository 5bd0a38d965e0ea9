use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use fedgate_core::CapabilityMap;

use crate::error::ServerError;

use super::AppState;

/// `GET /health` -- liveness probe for the federation server itself.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /v1/capabilities` -- the aggregate capability map across every
/// active gateway (C8, §4.8).
pub async fn capabilities(State(state): State<AppState>) -> Result<Json<CapabilityMap>, ServerError> {
    let caps = state.service.capabilities().await?;
    Ok(Json(caps))
}
