use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::broker::DeprovisionDetails;
use crate::http_server::api::ApiError;
use crate::ServiceState;

/// Service and plan ids arrive as query parameters on deletes
#[tracing::instrument(skip(state, details))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(instance_id): Path<String>,
    Query(details): Query<DeprovisionDetails>,
) -> Result<Response, ApiError> {
    let spec = state.broker().deprovision(&instance_id, details).await?;
    Ok((StatusCode::OK, Json(spec)).into_response())
}
