use chrono::{DateTime, Utc};

use cc_core::Clock;

/// Wall-clock time for the interactive shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
