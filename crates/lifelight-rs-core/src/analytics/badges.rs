//! Badge table and progress evaluation. Nothing here is persisted: progress
//! is recomputed from current records on every call.

use super::{Analytics, local_day};
use crate::records::HealthLog;
use chrono::NaiveTime;
use lifelight_rs_protocol::UserId;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeCategory {
    Medication,
    Health,
    Streak,
    Achievement,
}

/// Aggregate a badge is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeMetric {
    /// Medications ever added.
    TotalMedications,
    /// Adherence percentage over the adherence window.
    AdherenceRate,
    /// Distinct days with a health log.
    HealthLogDays,
    /// Most vital-sign readings present on a single health log.
    VitalSignsRecorded,
    /// Current consecutive-day dose streak.
    MedicationStreak,
    /// Distinct days with a dose logged before 08:00 local time.
    EarlyBirdDays,
    /// Active medications covered by at least one active reminder.
    MedicationsWithReminders,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: BadgeCategory,
    pub metric: BadgeMetric,
    pub threshold: u32,
}

pub const BADGES: &[BadgeDefinition] = &[
    BadgeDefinition {
        id: "first-medication",
        name: "First Steps",
        description: "Add your first medication",
        category: BadgeCategory::Medication,
        metric: BadgeMetric::TotalMedications,
        threshold: 1,
    },
    BadgeDefinition {
        id: "medication-master",
        name: "Medication Master",
        description: "Add 5 different medications",
        category: BadgeCategory::Medication,
        metric: BadgeMetric::TotalMedications,
        threshold: 5,
    },
    BadgeDefinition {
        id: "perfect-week",
        name: "Perfect Week",
        description: "Take every scheduled dose for a week",
        category: BadgeCategory::Medication,
        metric: BadgeMetric::AdherenceRate,
        threshold: 100,
    },
    BadgeDefinition {
        id: "health-tracker",
        name: "Health Tracker",
        description: "Log your health on 5 different days",
        category: BadgeCategory::Health,
        metric: BadgeMetric::HealthLogDays,
        threshold: 5,
    },
    BadgeDefinition {
        id: "vital-signs",
        name: "Vital Signs",
        description: "Record all four vital signs in one log",
        category: BadgeCategory::Health,
        metric: BadgeMetric::VitalSignsRecorded,
        threshold: 4,
    },
    BadgeDefinition {
        id: "week-warrior",
        name: "Week Warrior",
        description: "Maintain a 7-day medication streak",
        category: BadgeCategory::Streak,
        metric: BadgeMetric::MedicationStreak,
        threshold: 7,
    },
    BadgeDefinition {
        id: "month-master",
        name: "Month Master",
        description: "Maintain a 30-day medication streak",
        category: BadgeCategory::Streak,
        metric: BadgeMetric::MedicationStreak,
        threshold: 30,
    },
    BadgeDefinition {
        id: "early-bird",
        name: "Early Bird",
        description: "Take a dose before 8 AM on 5 days",
        category: BadgeCategory::Achievement,
        metric: BadgeMetric::EarlyBirdDays,
        threshold: 5,
    },
    BadgeDefinition {
        id: "reminder-setter",
        name: "Reminder Setter",
        description: "Set up reminders for 3 active medications",
        category: BadgeCategory::Achievement,
        metric: BadgeMetric::MedicationsWithReminders,
        threshold: 3,
    },
];

/// Progress of one badge at evaluation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeProgress {
    pub id: &'static str,
    pub name: &'static str,
    pub category: BadgeCategory,
    /// Capped at `threshold`.
    pub progress: u32,
    pub threshold: u32,
    pub unlocked: bool,
}

impl BadgeProgress {
    fn evaluate(definition: &BadgeDefinition, value: u32) -> Self {
        Self {
            id: definition.id,
            name: definition.name,
            category: definition.category,
            progress: value.min(definition.threshold),
            threshold: definition.threshold,
            unlocked: value >= definition.threshold,
        }
    }
}

/// Badges unlocked in `current` that were not unlocked in `previous`.
pub fn newly_unlocked(previous: &[BadgeProgress], current: &[BadgeProgress]) -> Vec<BadgeProgress> {
    let already: HashSet<&str> = previous
        .iter()
        .filter(|badge| badge.unlocked)
        .map(|badge| badge.id)
        .collect();
    current
        .iter()
        .filter(|badge| badge.unlocked && !already.contains(badge.id))
        .cloned()
        .collect()
}

/// Metric values for one user, computed once per evaluation.
struct Metrics {
    total_medications: u32,
    adherence_rate: u32,
    health_log_days: u32,
    vital_signs_recorded: u32,
    medication_streak: u32,
    early_bird_days: u32,
    medications_with_reminders: u32,
}

impl Metrics {
    fn value(&self, metric: BadgeMetric) -> u32 {
        match metric {
            BadgeMetric::TotalMedications => self.total_medications,
            BadgeMetric::AdherenceRate => self.adherence_rate,
            BadgeMetric::HealthLogDays => self.health_log_days,
            BadgeMetric::VitalSignsRecorded => self.vital_signs_recorded,
            BadgeMetric::MedicationStreak => self.medication_streak,
            BadgeMetric::EarlyBirdDays => self.early_bird_days,
            BadgeMetric::MedicationsWithReminders => self.medications_with_reminders,
        }
    }
}

fn count(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn vital_sign_count(log: &HealthLog) -> u32 {
    let Some(vitals) = &log.vital_signs else {
        return 0;
    };
    [
        vitals.blood_pressure.is_some(),
        vitals.heart_rate.is_some(),
        vitals.weight.is_some(),
        vitals.temperature.is_some(),
    ]
    .into_iter()
    .map(u32::from)
    .sum()
}

impl Analytics {
    /// Progress for every badge in [`BADGES`], in table order.
    pub fn badge_progress(&self, user_id: UserId) -> Vec<BadgeProgress> {
        let metrics = self.metrics(user_id);
        BADGES
            .iter()
            .map(|definition| BadgeProgress::evaluate(definition, metrics.value(definition.metric)))
            .collect()
    }

    fn metrics(&self, user_id: UserId) -> Metrics {
        let now = self.now();
        let offset = now.offset();
        let medications = self.store.list_medications(user_id);
        let health_logs = self.store.list_health_logs(user_id, None);
        let dose_logs = self.store.list_medication_logs(user_id, None);

        let early_cutoff = NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN);
        let early_bird_days: BTreeSet<_> = dose_logs
            .iter()
            .filter(|log| log.taken_at.with_timezone(offset).time() < early_cutoff)
            .map(|log| local_day(log, offset))
            .collect();

        let reminded: HashSet<_> = self
            .store
            .list_active_reminders(user_id)
            .into_iter()
            .map(|reminder| reminder.medication_id)
            .collect();
        let medications_with_reminders = medications
            .iter()
            .filter(|medication| medication.is_active && reminded.contains(&medication.id))
            .count();

        let health_log_days: BTreeSet<_> = health_logs.iter().map(|log| log.date).collect();
        let adherence = self.adherence_rate(user_id, self.config.adherence_window_days);

        Metrics {
            total_medications: count(medications.len()),
            adherence_rate: adherence.floor() as u32,
            health_log_days: count(health_log_days.len()),
            vital_signs_recorded: health_logs.iter().map(vital_sign_count).max().unwrap_or(0),
            medication_streak: self.current_streak(user_id),
            early_bird_days: count(early_bird_days.len()),
            medications_with_reminders: count(medications_with_reminders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BADGES, BadgeDefinition, BadgeProgress, newly_unlocked};
    use pretty_assertions::assert_eq;

    fn progress(definition: &BadgeDefinition, value: u32) -> BadgeProgress {
        BadgeProgress::evaluate(definition, value)
    }

    #[test]
    fn table_has_nine_unique_badges() {
        assert_eq!(BADGES.len(), 9);
        let mut ids: Vec<_> = BADGES.iter().map(|badge| badge.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 9);
    }

    #[test]
    fn progress_is_capped_at_threshold() {
        let master = &BADGES[1];
        assert_eq!(progress(master, 3).unlocked, false);
        let done = progress(master, 12);
        assert_eq!(done.progress, master.threshold);
        assert_eq!(done.unlocked, true);
    }

    #[test]
    fn diff_reports_only_fresh_unlocks() {
        let first = &BADGES[0];
        let master = &BADGES[1];
        let before = vec![progress(first, 1), progress(master, 4)];
        let after = vec![progress(first, 2), progress(master, 5)];
        let fresh = newly_unlocked(&before, &after);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "medication-master");
    }
}
