use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod apis;
pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod rpc;

use rpc::{registry::Registry, RPC_PATH};

#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/rpc", get(http::handlers::discovery))
        .route(RPC_PATH, post(http::handlers::rpc_endpoint))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
