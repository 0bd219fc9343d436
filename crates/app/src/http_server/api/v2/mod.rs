//! Open Service Broker API, version 2

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

pub mod bindings;
pub mod catalog;
pub mod instances;

use crate::http_server::auth::require_basic_auth;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/catalog", get(catalog::handler))
        .merge(instances::router(state.clone()))
        .merge(bindings::router(state.clone()))
        .route_layer(from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}
