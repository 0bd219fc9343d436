use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::broker::UpdateDetails;
use crate::http_server::api::ApiError;
use crate::ServiceState;

#[tracing::instrument(skip(state, details))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(instance_id): Path<String>,
    Json(details): Json<UpdateDetails>,
) -> Result<Response, ApiError> {
    let spec = state.broker().update(&instance_id, details).await?;
    Ok((StatusCode::OK, Json(spec)).into_response())
}
