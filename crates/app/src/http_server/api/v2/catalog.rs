use axum::extract::State;
use axum::Json;

use crate::config::Catalog;
use crate::ServiceState;

pub async fn handler(State(state): State<ServiceState>) -> Json<Catalog> {
    Json(state.catalog().clone())
}
