use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Errors surfaced by the composition root: configuration/startup failures
/// and the federation service's own error taxonomy, translated to HTTP
/// responses at the API boundary.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Federation(#[from] fedgate_federation::FederationError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Federation(e) => match e {
                fedgate_federation::FederationError::NotFound(_) => StatusCode::NOT_FOUND,
                fedgate_federation::FederationError::NameConflict { .. } => StatusCode::CONFLICT,
                fedgate_federation::FederationError::ForwardingRejected(_) => StatusCode::CONFLICT,
                fedgate_federation::FederationError::UpstreamUnavailable(_)
                | fedgate_federation::FederationError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
                fedgate_federation::FederationError::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                fedgate_federation::FederationError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
