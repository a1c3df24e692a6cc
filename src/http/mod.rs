//! HTTP transport for the call dispatcher
//!
//! Provides the `/rpc` endpoint along with health and discovery metadata endpoints.

pub mod handlers;
