use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;

pub mod find_group;

use crate::http_server::auth::require_basic_auth;
use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/find-group", get(find_group::handler))
        .route_layer(from_fn_with_state(state.clone(), require_basic_auth))
        .with_state(state)
}
