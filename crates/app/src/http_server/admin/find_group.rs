use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::broker::BrokerError;
use crate::http_server::api::ApiError;
use crate::ServiceState;

#[derive(Debug, Deserialize)]
pub struct FindGroupQuery {
    /// Full storage name of the bucket
    pub bucket: Option<String>,
}

/// Report which instance group owns a bucket, as a JSON string
#[tracing::instrument(skip(state))]
pub async fn handler(
    State(state): State<ServiceState>,
    Query(query): Query<FindGroupQuery>,
) -> Result<Response, FindGroupError> {
    let bucket = query
        .bucket
        .filter(|b| !b.trim().is_empty())
        .ok_or(FindGroupError::MissingBucket)?;

    let group = state.broker().find_group_owning_bucket(&bucket).await?;
    Ok((StatusCode::OK, Json(group)).into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum FindGroupError {
    #[error("bucket query parameter is required")]
    MissingBucket,
    #[error(transparent)]
    Broker(#[from] BrokerError),
}

impl IntoResponse for FindGroupError {
    fn into_response(self) -> Response {
        match self {
            FindGroupError::MissingBucket => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "InvalidParameters",
                    "description": self.to_string(),
                })),
            )
                .into_response(),
            FindGroupError::Broker(err) => ApiError(err).into_response(),
        }
    }
}
