use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::broker::UnbindDetails;
use crate::http_server::api::ApiError;
use crate::ServiceState;

#[tracing::instrument(skip(state, details))]
pub async fn handler(
    State(state): State<ServiceState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(details): Query<UnbindDetails>,
) -> Result<Response, ApiError> {
    let spec = state
        .broker()
        .unbind(&instance_id, &binding_id, details)
        .await?;
    Ok((StatusCode::OK, Json(spec)).into_response())
}
