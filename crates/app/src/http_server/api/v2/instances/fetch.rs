use axum::extract::{Path, Query, State};
use axum::Json;

use crate::broker::{GetInstanceDetailsSpec, LastOperation, PollDetails};
use crate::http_server::api::ApiError;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path(instance_id): Path<String>,
) -> Result<Json<GetInstanceDetailsSpec>, ApiError> {
    Ok(Json(state.broker().get_instance(&instance_id).await?))
}

pub async fn last_operation(
    State(state): State<ServiceState>,
    Path(instance_id): Path<String>,
    Query(details): Query<PollDetails>,
) -> Result<Json<LastOperation>, ApiError> {
    Ok(Json(
        state.broker().last_operation(&instance_id, details).await?,
    ))
}
