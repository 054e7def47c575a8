use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use augur_engine::EngineError;

/// Errors that can occur when running the Augur server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener or reading a file).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An engine-level error surfaced through the API.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// The request body was rejected.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(EngineError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            Self::Engine(EngineError::Store(_) | EngineError::ColdStart(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::Config(_)
            | Self::Io(_)
            | Self::Engine(EngineError::Cache(_) | EngineError::Configuration(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use augur_store::StoreError;

    use super::*;

    #[test]
    fn engine_errors_map_to_statuses() {
        let timeout = ServerError::from(EngineError::Timeout(Duration::from_millis(5)));
        assert_eq!(timeout.status(), StatusCode::GATEWAY_TIMEOUT);

        let store = ServerError::from(EngineError::Store(StoreError::Unavailable("down".into())));
        assert_eq!(store.status(), StatusCode::SERVICE_UNAVAILABLE);

        assert_eq!(
            ServerError::BadRequest("facts".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
