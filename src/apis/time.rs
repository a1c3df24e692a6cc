//! Clock methods exported through the registry.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};

use crate::rpc::registry::MethodError;

pub const CURRENT_TIME: &str = "currentTime";
pub const CURRENT_TIME_2: &str = "currentTime2";

/// Either epoch milliseconds or a human readable local timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeReading {
    Millis(i64),
    Localized(String),
}

/// Milliseconds since the Unix epoch.
pub fn current_time() -> Result<i64, MethodError> {
    Ok(Utc::now().timestamp_millis())
}

pub fn current_time2(to_locale_string: bool) -> Result<TimeReading, MethodError> {
    if to_locale_string {
        Ok(TimeReading::Localized(localized_now()))
    } else {
        Ok(TimeReading::Millis(Utc::now().timestamp_millis()))
    }
}

// e.g. "10/18/2026, 7:05:09 PM"
fn localized_now() -> String {
    Local::now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
}

crate::remote_api! {
    /// Typed client for the clock methods.
    pub struct TimeApi {
        /// Server clock in milliseconds since the Unix epoch.
        fn current_time() -> i64 = CURRENT_TIME;
        /// Server clock as a localized string, or epoch milliseconds when `false`.
        fn current_time2(to_locale_string: bool) -> TimeReading = CURRENT_TIME_2;
    }
}
