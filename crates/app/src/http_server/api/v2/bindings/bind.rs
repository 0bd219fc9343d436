use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::broker::BindDetails;
use crate::http_server::api::ApiError;
use crate::ServiceState;

#[tracing::instrument(skip(state, details))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Json(details): Json<BindDetails>,
) -> Result<Response, ApiError> {
    let binding = state
        .broker()
        .bind(&instance_id, &binding_id, details)
        .await?;
    Ok((StatusCode::CREATED, Json(binding)).into_response())
}
