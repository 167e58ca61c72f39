//! Time source, injected so cooldowns and the day gate are testable.

use chrono::{DateTime, Utc};
use std::time::Duration;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Block the calling thread. Test clocks advance `now` instead.
    fn sleep(&self, duration: Duration);
}
