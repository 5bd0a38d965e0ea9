pub mod events;
pub mod forward;
pub mod gateways;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use fedgate_federation::FederationService;
use tower_http::trace::TraceLayer;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<FederationService>,
}

/// Build the Axum router for the federation admin surface.
///
/// Deliberately minimal (§1: "HTTP admin surface ... beyond its signature"
/// is out of scope) — this exists to prove the federation core is
/// composable behind a real transport, not to be a complete API gateway.
/// No auth middleware is wired here; a caller embedding this crate is
/// expected to put its own auth layer in front.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/v1/capabilities", get(health::capabilities))
        .route("/v1/events", get(events::subscribe))
        .route("/v1/gateways", get(gateways::list).post(gateways::register))
        .route(
            "/v1/gateways/{id}",
            get(gateways::get).patch(gateways::update).delete(gateways::delete),
        )
        .route("/v1/gateways/{id}/toggle", post(gateways::toggle))
        .route("/v1/gateways/{id}/forward", post(forward::forward))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
