use axum::Router;

mod error;
pub mod v2;

pub use error::ApiError;

use crate::ServiceState;

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .nest("/v2", v2::router(state.clone()))
        .with_state(state)
}
