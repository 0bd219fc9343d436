use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::broker::BrokerError;

/// Error body returned on every failed broker call
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub description: String,
}

/// A broker failure on its way out as an HTTP response
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub BrokerError);

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            BrokerError::AlreadyExists => (StatusCode::CONFLICT, "AlreadyExists"),
            BrokerError::InvalidParameters(_) => (StatusCode::BAD_REQUEST, "InvalidParameters"),
            BrokerError::NotFound(_) => (StatusCode::NOT_FOUND, "NotFound"),
            BrokerError::NotRetrievable(_) => (StatusCode::NOT_FOUND, "NotRetrievable"),
            BrokerError::PartialFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PartialFailure")
            }
            BrokerError::Admin(_) | BrokerError::Policy(_) | BrokerError::Storage(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "broker call failed");
        } else {
            tracing::info!(error = %self.0, status = status.as_u16(), "broker call rejected");
        }

        let body = ErrorBody {
            error: code,
            description: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
