use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use fedgate_core::{Gateway, GatewayId, GatewayInput, GatewayPatch};
use serde::Deserialize;

use crate::error::ServerError;

use super::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct IncludeInactive {
    #[serde(default)]
    pub include_inactive: bool,
}

/// `GET /v1/gateways` -- list gateways (§4.6 `list`).
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<IncludeInactive>,
) -> Result<Json<Vec<Gateway>>, ServerError> {
    let gateways = state.service.registry().list(query.include_inactive).await?;
    Ok(Json(gateways))
}

/// `GET /v1/gateways/{id}` -- fetch a single gateway (§4.6 `get`).
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<GatewayId>,
    Query(query): Query<IncludeInactive>,
) -> Result<Json<Gateway>, ServerError> {
    let gateway = state.service.registry().get(id, query.include_inactive).await?;
    Ok(Json(gateway))
}

/// `POST /v1/gateways` -- register a gateway (§4.6 `register`).
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<GatewayInput>,
) -> Result<(StatusCode, Json<Gateway>), ServerError> {
    let gateway = state.service.registry().register(input).await?;
    Ok((StatusCode::CREATED, Json(gateway)))
}

/// `PATCH /v1/gateways/{id}` -- update a gateway's fields (§4.6 `update`).
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<GatewayId>,
    Json(patch): Json<GatewayPatch>,
) -> Result<Json<Gateway>, ServerError> {
    let gateway = state.service.registry().update(id, patch).await?;
    Ok(Json(gateway))
}

#[derive(Debug, Deserialize)]
pub struct TogglePayload {
    pub enabled: bool,
}

/// `POST /v1/gateways/{id}/toggle` -- enable/disable a gateway (§4.6 `toggle`).
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<GatewayId>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<Gateway>, ServerError> {
    let gateway = state.service.registry().toggle(id, payload.enabled).await?;
    Ok(Json(gateway))
}

/// `DELETE /v1/gateways/{id}` -- hard-delete a gateway and its tools (§4.6 `delete`).
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<GatewayId>,
) -> Result<StatusCode, ServerError> {
    state.service.registry().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
