use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone};
use lifelight_rs_protocol::Clock;
use parking_lot::Mutex;

/// Clock whose instant only moves when a test moves it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl ManualClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Build a clock at a UTC wall-clock time; panics on invalid input.
    pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Self {
        Self::new(local(year, month, day, hour, minute))
    }

    pub fn set(&self, now: DateTime<FixedOffset>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock()
    }
}

/// Wall-clock instant at UTC+0; panics on invalid input.
pub fn local(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .expect("valid wall-clock time");
    FixedOffset::east_opt(0)
        .expect("utc offset")
        .from_local_datetime(&naive)
        .single()
        .expect("unambiguous time")
}
