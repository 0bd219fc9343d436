use axum::routing::get;
use axum::Router;

pub mod deprovision;
pub mod fetch;
pub mod provision;
pub mod update;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route(
            "/service_instances/:instance_id",
            get(fetch::handler)
                .put(provision::handler)
                .patch(update::handler)
                .delete(deprovision::handler),
        )
        .route(
            "/service_instances/:instance_id/last_operation",
            get(fetch::last_operation),
        )
        .with_state(state)
}
