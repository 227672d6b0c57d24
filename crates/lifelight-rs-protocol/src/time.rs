//! Wall-clock time of day used by reminders and check-ins.

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Local hour and minute, written as `HH:MM` (24h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderTime {
    hour: u8,
    minute: u8,
}

/// Error returned for malformed `HH:MM` strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day {0:?}: expected HH:MM")]
pub struct ParseReminderTimeError(String);

impl ReminderTime {
    /// Build a time of day; `None` when out of range.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self { hour, minute })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Convert to a chrono time at second zero.
    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), u32::from(self.minute), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for ReminderTime {
    type Err = ParseReminderTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseReminderTimeError(value.to_string());
        let (hour, minute) = value.trim().split_once(':').ok_or_else(invalid)?;
        if hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u8 = hour.parse().map_err(|_| invalid())?;
        let minute: u8 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ReminderTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for ReminderTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ReminderTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::ReminderTime;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_and_formats_padded_times() {
        let time: ReminderTime = "8:05".parse().expect("time");
        assert_eq!(time, ReminderTime::new(8, 5).expect("valid"));
        assert_eq!(time.to_string(), "08:05");
    }

    #[test]
    fn rejects_out_of_range_and_malformed() {
        for raw in ["24:00", "12:60", "12", "12:5", "ab:cd", ":30", "123:00"] {
            assert!(raw.parse::<ReminderTime>().is_err(), "accepted {raw}");
        }
    }

    #[test]
    fn serde_uses_string_form() {
        let time = ReminderTime::new(20, 30).expect("valid");
        assert_eq!(serde_json::to_string(&time).expect("json"), "\"20:30\"");
        let back: ReminderTime = serde_json::from_str("\"20:30\"").expect("parse");
        assert_eq!(back, time);
    }
}
