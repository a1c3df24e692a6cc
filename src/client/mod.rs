//! Client side of the call convention
//!
//! Provides the call router, which picks between an in-process registry call and an
//! HTTP round trip, and the `remote_api!` macro that builds typed clients on top of it.

pub mod proxy;
pub mod router;
