//! Call dispatch
//!
//! Decodes a raw call envelope, runs it against the registry and audits the outcome.

use serde_json::Value;
use tracing::info;

use crate::errors::RpcError;
use crate::rpc::{envelope::CallEnvelope, registry::Registry};

pub async fn dispatch(registry: &Registry, body: &[u8]) -> Result<Value, RpcError> {
    let envelope = match CallEnvelope::decode(body) {
        Ok(envelope) => envelope,
        Err(err) => {
            info!(outcome = "malformed", body_bytes = body.len(), "rpc call rejected");
            return Err(err);
        }
    };

    dispatch_envelope(registry, envelope).await
}

pub async fn dispatch_envelope(registry: &Registry, envelope: CallEnvelope) -> Result<Value, RpcError> {
    let CallEnvelope { method, data } = envelope;
    let arg_count = data.len();

    let result = registry.invoke(&method, data).await;

    info!(
        method = %method,
        arg_count,
        outcome = outcome_label(&result),
        "rpc call audited"
    );

    result
}

fn outcome_label(result: &Result<Value, RpcError>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(RpcError::MethodNotFound { .. }) => "not_found",
        Err(RpcError::ArityMismatch { .. } | RpcError::InvalidArgument { .. }) => "invalid_arguments",
        Err(_) => "failure",
    }
}
