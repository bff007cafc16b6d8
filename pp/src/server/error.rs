//! Mapping of core errors onto HTTP responses

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::progress::ProgressError;
use crate::relay::RelayError;

/// Error returned by a handler
#[derive(Debug)]
pub enum ApiError {
    Progress(ProgressError),
    Relay(RelayError),
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Progress(e) => match e {
                ProgressError::NotConfigured => StatusCode::CONFLICT,
                ProgressError::ChannelError => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Relay(e) => match e {
                RelayError::Configuration(_)
                | RelayError::DimensionMismatch { .. }
                | RelayError::StrategyMismatch { .. } => StatusCode::BAD_REQUEST,
                RelayError::StaleRun { .. } => StatusCode::CONFLICT,
                RelayError::NoStrategy(_) | RelayError::OutOfBounds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                RelayError::RelayTimeout { .. } => StatusCode::BAD_GATEWAY,
                RelayError::ProgressReport(_) | RelayError::Authority(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Progress(e) => e.to_string(),
            Self::Relay(e) => e.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

impl From<ProgressError> for ApiError {
    fn from(e: ProgressError) -> Self {
        Self::Progress(e)
    }
}

impl From<RelayError> for ApiError {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();
        debug!(%status, %message, "ApiError::into_response: called");
        (status, Json(serde_json::json!({"error": message}))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::Peer;
    use crate::strategy::NoStrategy;

    #[test]
    fn test_progress_status_codes() {
        assert_eq!(
            ApiError::from(ProgressError::NotConfigured).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(ProgressError::MissingColor).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ProgressError::ChannelError).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_relay_status_codes() {
        assert_eq!(
            ApiError::from(RelayError::from(NoStrategy { total_pixels: 25_000_000 })).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(RelayError::RelayTimeout {
                peer: Peer::Pong,
                message: "refused".to_string()
            })
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(RelayError::Configuration("m is required".to_string())).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
