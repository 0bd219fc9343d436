use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::broker::ProvisionDetails;
use crate::http_server::api::ApiError;
use crate::ServiceState;

#[tracing::instrument(skip(state, details), fields(plan = %details.plan_id))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path(instance_id): Path<String>,
    Json(details): Json<ProvisionDetails>,
) -> Result<Response, ApiError> {
    let spec = state.broker().provision(&instance_id, details).await?;
    Ok((StatusCode::CREATED, Json(spec)).into_response())
}
