//! Server side of the call convention
//!
//! Provides the call envelope wire type, the method registry and the dispatcher that
//! ties a raw request body to a registry invocation.

pub mod dispatcher;
pub mod envelope;
pub mod registry;

pub const RPC_PATH: &str = "/rpc";
