//! Methods this server exports
//!
//! New methods are added here; the dispatcher and router pick them up unchanged.

pub mod time;

pub use time::{TimeApi, TimeReading, CURRENT_TIME, CURRENT_TIME_2};

use crate::rpc::registry::{Registry, RegistryBuilder, RegistryError};

pub fn registry() -> Result<Registry, RegistryError> {
    RegistryBuilder::new()
        .register_sync(CURRENT_TIME, time::current_time)
        .register_sync(CURRENT_TIME_2, time::current_time2)
        .build()
}
