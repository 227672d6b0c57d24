//! Notification events emitted for the host platform.

use crate::{MedicationId, ReminderId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Navigation target for medication reminders.
const ACTION_MEDICATIONS: &str = "/medications";
/// Navigation target for health check-ins.
const ACTION_HEALTH_LOG: &str = "/health-log";
/// Navigation target for interaction alerts.
const ACTION_INSIGHTS: &str = "/ai-insights";
/// Navigation target for achievements.
const ACTION_BADGES: &str = "/badges";

/// Notification handed to the dispatcher collaborator.
///
/// `tag` is deterministic per logical occurrence so that the host can
/// coalesce or replace duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEvent {
    /// Short headline.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Coalescing key.
    pub tag: String,
    /// Whether the notification stays until the user interacts with it.
    pub require_interaction: bool,
    /// Click-through payload.
    pub data: NotificationData,
}

/// Click-through payload attached to a notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Navigation target used by the UI on click-through.
    pub action: String,
    /// Reminder that produced the notification, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_id: Option<ReminderId>,
    /// Medication the notification refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication_id: Option<MedicationId>,
}

impl NotificationEvent {
    /// Reminder that a dose is due for one reminder occurrence.
    pub fn medication_reminder(
        reminder_id: ReminderId,
        medication_id: MedicationId,
        medication_name: &str,
        dosage: &str,
        occurrence: NaiveDate,
    ) -> Self {
        Self {
            title: "Medication Reminder".to_string(),
            body: format!("Time to take {medication_name} ({dosage})"),
            tag: format!("medication-{reminder_id}-{occurrence}"),
            require_interaction: true,
            data: NotificationData {
                action: ACTION_MEDICATIONS.to_string(),
                reminder_id: Some(reminder_id),
                medication_id: Some(medication_id),
            },
        }
    }

    /// Daily prompt to record how the user feels.
    pub fn health_check_in(day: NaiveDate) -> Self {
        Self {
            title: "Health Check-in".to_string(),
            body: "How are you feeling today? Take a moment to log your health.".to_string(),
            tag: format!("health-check-in-{day}"),
            require_interaction: false,
            data: NotificationData {
                action: ACTION_HEALTH_LOG.to_string(),
                reminder_id: None,
                medication_id: None,
            },
        }
    }

    /// Alert about a known interaction between two medications.
    pub fn interaction_warning(first: &str, second: &str) -> Self {
        let (a, b) = if first.to_lowercase() <= second.to_lowercase() {
            (first, second)
        } else {
            (second, first)
        };
        Self {
            title: "Drug Interaction Alert".to_string(),
            body: format!(
                "Potential interaction detected between {first} and {second}. Please consult your doctor."
            ),
            tag: format!("interaction-{}-{}", a.to_lowercase(), b.to_lowercase()),
            require_interaction: true,
            data: NotificationData {
                action: ACTION_INSIGHTS.to_string(),
                reminder_id: None,
                medication_id: None,
            },
        }
    }

    /// Congratulation for a newly unlocked badge.
    pub fn achievement_unlocked(badge_id: &str, badge_name: &str) -> Self {
        Self {
            title: "Achievement Unlocked!".to_string(),
            body: format!("Congratulations! You've earned the \"{badge_name}\" badge."),
            tag: format!("achievement-{badge_id}"),
            require_interaction: false,
            data: NotificationData {
                action: ACTION_BADGES.to_string(),
                reminder_id: None,
                medication_id: None,
            },
        }
    }
}

/// Errors returned when a notification cannot be delivered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// Nobody is listening for notifications.
    #[error("no notification subscribers")]
    NoSubscribers,
    /// The host platform refused the notification.
    #[error("notification rejected: {0}")]
    Rejected(String),
}

/// Delivery seam towards the host's notification facility.
///
/// Delivery is fire-and-forget from the scheduler's perspective: a failure is
/// reported back but never retried.
pub trait NotificationDispatcher: Send + Sync {
    /// Deliver a notification to the host.
    fn dispatch(&self, event: &NotificationEvent) -> Result<(), DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn medication_reminder_serializes_in_host_shape() {
        let reminder_id = Uuid::nil();
        let medication_id = Uuid::from_u128(7);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let event =
            NotificationEvent::medication_reminder(reminder_id, medication_id, "Metformin", "500mg", day);

        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(
            value,
            json!({
                "title": "Medication Reminder",
                "body": "Time to take Metformin (500mg)",
                "tag": format!("medication-{reminder_id}-2024-01-01"),
                "requireInteraction": true,
                "data": {
                    "action": "/medications",
                    "reminderId": reminder_id,
                    "medicationId": medication_id,
                }
            })
        );
    }

    #[test]
    fn reminder_tag_differs_per_occurrence_day() {
        let id = Uuid::new_v4();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let tuesday = NaiveDate::from_ymd_opt(2024, 1, 2).expect("date");
        let first = NotificationEvent::medication_reminder(id, id, "A", "1", monday);
        let again = NotificationEvent::medication_reminder(id, id, "A", "1", monday);
        let next = NotificationEvent::medication_reminder(id, id, "A", "1", tuesday);
        assert_eq!(first.tag, again.tag);
        assert!(first.tag != next.tag);
    }

    #[test]
    fn interaction_tag_ignores_argument_order() {
        let forward = NotificationEvent::interaction_warning("Warfarin", "aspirin");
        let reverse = NotificationEvent::interaction_warning("Aspirin", "warfarin");
        assert_eq!(forward.tag, reverse.tag);
        assert_eq!(forward.tag, "interaction-aspirin-warfarin");
    }

    #[test]
    fn health_check_in_omits_ids() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 5).expect("date");
        let value = serde_json::to_value(NotificationEvent::health_check_in(day)).expect("json");
        assert_eq!(value["tag"], json!("health-check-in-2024-03-05"));
        assert_eq!(value["data"], json!({ "action": "/health-log" }));
    }
}
