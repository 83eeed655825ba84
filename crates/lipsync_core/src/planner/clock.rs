//! Time source for combination timestamps.

use chrono::{DateTime, Local};

/// Format of the timestamp embedded in output names.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Source of the creation time stamped on each combination.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Wall clock in local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}
