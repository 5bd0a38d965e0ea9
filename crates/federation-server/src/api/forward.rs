use axum::extract::{Path, State};
use axum::Json;
use fedgate_core::GatewayId;
use serde::Deserialize;

use crate::error::ServerError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ForwardPayload {
    pub method: String,
    #[serde(default)]
    pub params: Option<serde_json::Value>,
}

/// `POST /v1/gateways/{id}/forward` -- relay a JSON-RPC call to the
/// gateway's `/rpc` endpoint (C7, §4.7). Rejects with a typed error and no
/// outbound HTTP if the gateway is disabled (P9).
pub async fn forward(
    State(state): State<AppState>,
    Path(id): Path<GatewayId>,
    Json(payload): Json<ForwardPayload>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let gateway = state.service.registry().get(id, true).await?;
    let result = state
        .service
        .forwarder()
        .forward(&gateway, &payload.method, payload.params)
        .await?;
    Ok(Json(result))
}
