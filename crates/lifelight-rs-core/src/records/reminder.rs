use super::{Record, RecordKind};
use crate::error::StoreError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lifelight_rs_protocol::{MedicationId, ReminderId, ReminderTime, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Weekday numbers run 0 (Sunday) through 6 (Saturday).
pub const MAX_WEEKDAY: u8 = 6;

/// Standing reminder for one medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationReminder {
    pub id: ReminderId,
    pub medication_id: MedicationId,
    pub user_id: UserId,
    /// Local wall-clock time of day.
    pub time: ReminderTime,
    /// Weekdays the reminder fires on, sorted and de-duplicated.
    pub days: Vec<u8>,
    pub is_active: bool,
    /// Written only by the scheduler.
    #[serde(default)]
    pub last_triggered: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new reminder.
#[derive(Debug, Clone)]
pub struct NewReminder {
    pub medication_id: MedicationId,
    pub user_id: UserId,
    pub time: ReminderTime,
    pub days: Vec<u8>,
    pub is_active: bool,
}

impl NewReminder {
    /// Active reminder on every day of the week.
    pub fn daily(user_id: UserId, medication_id: MedicationId, time: ReminderTime) -> Self {
        Self {
            medication_id,
            user_id,
            time,
            days: (0..=MAX_WEEKDAY).collect(),
            is_active: true,
        }
    }
}

/// Partial update for a reminder.
#[derive(Debug, Clone, Default)]
pub struct ReminderPatch {
    pub time: Option<ReminderTime>,
    pub days: Option<Vec<u8>>,
    pub is_active: Option<bool>,
}

impl MedicationReminder {
    pub(crate) fn from_new(new: NewReminder) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: Uuid::new_v4(),
            medication_id: new.medication_id,
            user_id: new.user_id,
            time: new.time,
            days: normalize_days(new.days),
            is_active: new.is_active,
            last_triggered: None,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    pub(crate) fn apply(&mut self, patch: ReminderPatch) {
        if let Some(time) = patch.time {
            self.time = time;
        }
        if let Some(days) = patch.days {
            self.days = normalize_days(days);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
    }

    /// True when the reminder is scheduled on the given local date's weekday.
    pub fn fires_on(&self, date: NaiveDate) -> bool {
        weekday_number(date)
            .try_into()
            .is_ok_and(|weekday: u8| self.days.contains(&weekday))
    }
}

/// Weekday of a date numbered from Sunday = 0.
pub fn weekday_number(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

fn normalize_days(mut days: Vec<u8>) -> Vec<u8> {
    days.sort_unstable();
    days.dedup();
    days
}

impl Record for MedicationReminder {
    const KIND: RecordKind = RecordKind::MedicationReminder;

    fn id(&self) -> Uuid {
        self.id
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
        self.updated_at = at;
    }

    fn stamp_updated(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }

    fn validate(&self) -> Result<(), StoreError> {
        if let Some(day) = self.days.iter().find(|day| **day > MAX_WEEKDAY) {
            return Err(StoreError::validation(format!(
                "reminder day {day} is outside 0..={MAX_WEEKDAY}"
            )));
        }
        if self.is_active && self.days.is_empty() {
            return Err(StoreError::validation(
                "an active reminder needs at least one day",
            ));
        }
        Ok(())
    }
}
