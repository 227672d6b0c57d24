//! Time source abstraction.

use chrono::{DateTime, FixedOffset, Local, Utc};

/// Source of the current instant, carrying the local UTC offset so that
/// wall-clock rules (reminder times, calendar days) can be evaluated.
pub trait Clock: Send + Sync {
    /// Current instant in local time.
    fn now(&self) -> DateTime<FixedOffset>;

    /// Current instant normalized to UTC.
    fn now_utc(&self) -> DateTime<Utc> {
        self.now().with_timezone(&Utc)
    }
}

/// Clock backed by the host's system time and timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
