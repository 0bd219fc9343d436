use axum::routing::get;
use axum::Router;

pub mod bind;
pub mod fetch;
pub mod unbind;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route(
            "/service_instances/:instance_id/service_bindings/:binding_id",
            get(fetch::handler)
                .put(bind::handler)
                .delete(unbind::handler),
        )
        .route(
            "/service_instances/:instance_id/service_bindings/:binding_id/last_operation",
            get(fetch::last_operation),
        )
        .with_state(state)
}
