//! Axum HTTP handlers for the web server
//!
//! `rpc_endpoint` terminates the call protocol; the other handlers expose metadata.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::RpcError;
use crate::rpc::{dispatcher::dispatch, RPC_PATH};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub rpc_endpoint: &'static str,
    pub methods: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        rpc_endpoint: RPC_PATH,
        methods: state.registry.names().into_iter().map(str::to_string).collect(),
    })
}

/// The `Bytes` extractor has already drained the request body to end of stream.
pub async fn rpc_endpoint(State(state): State<AppState>, body: Bytes) -> Result<Response, RpcError> {
    let result = dispatch(&state.registry, &body).await?;
    Ok((StatusCode::OK, Json(result)).into_response())
}
