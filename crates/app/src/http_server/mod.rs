use axum::http::header::AUTHORIZATION;
use axum::{Extension, Router};
use tokio::sync::watch;
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse};
use tower_http::LatencyUnit;

pub mod admin;
pub mod api;
mod auth;
mod config;
mod handlers;
mod health;

pub use config::Config;

use crate::ServiceState;

const ADMIN_PREFIX: &str = "/admin";
const STATUS_PREFIX: &str = "/_status";

/// All routes, without the tracing layers `run` adds
pub fn router(state: ServiceState) -> Router {
    Router::new()
        .nest(STATUS_PREFIX, health::router(state.clone()))
        .merge(api::router(state.clone()))
        .nest(ADMIN_PREFIX, admin::router(state.clone()))
        .fallback(handlers::not_found_handler)
        .with_state(state)
}

pub async fn run(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let log_level = config.log_level;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .include_headers(false)
                .level(log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));

    let app = router(state)
        .layer(Extension(config.clone()))
        .layer(trace_layer)
        .layer(SetSensitiveRequestHeadersLayer::new(std::iter::once(
            AUTHORIZATION,
        )));

    tracing::info!(addr = ?listen_addr, "broker API listening");
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await?;

    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("an error occurred running the HTTP server: {0}")]
    ServingFailed(#[from] std::io::Error),
}
