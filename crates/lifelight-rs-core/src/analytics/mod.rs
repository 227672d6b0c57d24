//! Read-only aggregates derived from stored history.
//!
//! Windows are calendar windows in the clock's local offset: `n` days means
//! today plus the `n - 1` days before it, and `n = 0` is empty.

mod badges;

pub use badges::{BADGES, BadgeCategory, BadgeDefinition, BadgeMetric, BadgeProgress, newly_unlocked};

use crate::records::{MedicationLog, MedicationReminder};
use crate::store::RecordStore;
use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use lifelight_rs_config::AnalyticsConfig;
use lifelight_rs_protocol::{MedicationId, UserId};
use log::debug;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Window {
    /// Window of `days` ending on `today`; `None` when `days` is zero.
    pub fn ending(today: NaiveDate, days: u32) -> Option<Self> {
        let span = days.checked_sub(1)?;
        let start = today
            .checked_sub_days(Days::new(u64::from(span)))
            .unwrap_or(NaiveDate::MIN);
        Some(Self { start, end: today })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// Summary numbers for a user's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserStats {
    pub total_medications: usize,
    pub active_medications: usize,
    pub average_health_score: f64,
    pub adherence_rate: f64,
    pub unread_insights: usize,
}

/// Derivations over one record store.
pub struct Analytics {
    store: Arc<RecordStore>,
    config: AnalyticsConfig,
}

impl Analytics {
    pub fn new(store: Arc<RecordStore>, config: AnalyticsConfig) -> Self {
        Self { store, config }
    }

    fn now(&self) -> DateTime<FixedOffset> {
        self.store.clock().now()
    }

    /// Mean health score of logs dated in the window; `0.0` when there are none.
    pub fn average_health_score(&self, user_id: UserId, window_days: u32) -> f64 {
        let Some(window) = Window::ending(self.now().date_naive(), window_days) else {
            return 0.0;
        };
        let logs = self
            .store
            .health_logs_between(user_id, window.start, window.end);
        if logs.is_empty() {
            return 0.0;
        }
        let total: u32 = logs.iter().map(|log| u32::from(log.health_score)).sum();
        f64::from(total) / logs.len() as f64
    }

    /// Percentage of expected doses logged in the window, capped at 100.
    ///
    /// Every scheduled occurrence of an active reminder on an active
    /// medication is one expected dose; a dose log is one taken dose when
    /// its medication contributed expected doses.
    pub fn adherence_rate(&self, user_id: UserId, window_days: u32) -> f64 {
        self.adherence(user_id, None, window_days)
    }

    /// [`Analytics::adherence_rate`] restricted to one medication.
    pub fn medication_adherence_rate(
        &self,
        user_id: UserId,
        medication_id: MedicationId,
        window_days: u32,
    ) -> f64 {
        self.adherence(user_id, Some(medication_id), window_days)
    }

    fn adherence(&self, user_id: UserId, medication: Option<MedicationId>, window_days: u32) -> f64 {
        let now = self.now();
        let Some(window) = Window::ending(now.date_naive(), window_days) else {
            return 0.0;
        };
        let active: BTreeSet<MedicationId> = self
            .store
            .list_active_medications(user_id)
            .into_iter()
            .map(|medication| medication.id)
            .collect();
        let in_scope = |id: MedicationId| medication.is_none_or(|wanted| wanted == id);

        let mut scheduled = BTreeSet::new();
        let mut expected = 0;
        for reminder in self
            .store
            .list_active_reminders(user_id)
            .iter()
            .filter(|reminder| active.contains(&reminder.medication_id))
            .filter(|reminder| in_scope(reminder.medication_id))
        {
            let occurrences = scheduled_occurrences(reminder, &window);
            if occurrences > 0 {
                scheduled.insert(reminder.medication_id);
                expected += occurrences;
            }
        }
        if expected == 0 {
            return 0.0;
        }
        // Only doses of medications that were expected in the window count.
        let taken = self
            .store
            .list_medication_logs(user_id, None)
            .iter()
            .filter(|log| scheduled.contains(&log.medication_id))
            .filter(|log| window.contains(local_day(log, now.offset())))
            .count();
        debug!(
            "adherence computed (user_id={}, taken={}, expected={})",
            user_id, taken, expected
        );
        (taken as f64 * 100.0 / expected as f64).min(100.0)
    }

    /// Consecutive days with at least one dose logged, ending today (or
    /// yesterday while today has no log yet).
    pub fn current_streak(&self, user_id: UserId) -> u32 {
        let now = self.now();
        let days = self.dose_days(user_id, now.offset());
        let today = now.date_naive();
        let mut cursor = if days.contains(&today) {
            Some(today)
        } else {
            today.pred_opt()
        };
        let mut streak = 0;
        while let Some(day) = cursor.filter(|day| days.contains(day)) {
            streak += 1;
            cursor = day.pred_opt();
        }
        streak
    }

    /// Distinct local days with a dose logged.
    fn dose_days(&self, user_id: UserId, offset: &FixedOffset) -> BTreeSet<NaiveDate> {
        self.store
            .list_medication_logs(user_id, None)
            .iter()
            .map(|log| local_day(log, offset))
            .collect()
    }

    /// Dashboard numbers over the configured summary window.
    pub fn user_stats(&self, user_id: UserId) -> UserStats {
        let medications = self.store.list_medications(user_id);
        UserStats {
            total_medications: medications.len(),
            active_medications: medications
                .iter()
                .filter(|medication| medication.is_active)
                .count(),
            average_health_score: self.average_health_score(user_id, self.config.window_days),
            adherence_rate: self.adherence_rate(user_id, self.config.window_days),
            unread_insights: self.store.list_insights(user_id, true).len(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }
}

fn scheduled_occurrences(reminder: &MedicationReminder, window: &Window) -> usize {
    window.days().filter(|day| reminder.fires_on(*day)).count()
}

/// Calendar day a dose was taken, in the given local offset.
pub(crate) fn local_day(log: &MedicationLog, offset: &FixedOffset) -> NaiveDate {
    log.taken_at.with_timezone(offset).date_naive()
}

#[cfg(test)]
mod tests {
    use super::Window;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).expect("date")
    }

    #[test]
    fn window_covers_today_and_previous_days() {
        let window = Window::ending(day(10), 3).expect("window");
        assert_eq!(window.start, day(8));
        assert_eq!(window.days().collect::<Vec<_>>(), vec![day(8), day(9), day(10)]);
        assert!(window.contains(day(10)));
        assert!(!window.contains(day(7)));
    }

    #[test]
    fn zero_day_window_is_empty() {
        assert_eq!(Window::ending(day(10), 0), None);
    }
}
