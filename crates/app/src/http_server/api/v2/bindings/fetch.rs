use axum::extract::{Path, Query, State};
use axum::Json;

use crate::broker::{GetBindingSpec, LastOperation, PollDetails};
use crate::http_server::api::ApiError;
use crate::ServiceState;

pub async fn handler(
    State(state): State<ServiceState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
) -> Result<Json<GetBindingSpec>, ApiError> {
    Ok(Json(
        state.broker().get_binding(&instance_id, &binding_id).await?,
    ))
}

pub async fn last_operation(
    State(state): State<ServiceState>,
    Path((instance_id, binding_id)): Path<(String, String)>,
    Query(details): Query<PollDetails>,
) -> Result<Json<LastOperation>, ApiError> {
    Ok(Json(
        state
            .broker()
            .last_binding_operation(&instance_id, &binding_id, details)
            .await?,
    ))
}
