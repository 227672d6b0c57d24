//! Entity records owned by the record store.

mod dose;
mod health;
mod insight;
mod interaction;
mod medication;
mod reminder;
mod user;

pub use dose::{MedicationLog, NewMedicationLog};
pub use health::{HealthLog, MAX_HEALTH_SCORE, NewHealthLog, VitalSigns};
pub use insight::{AiInsight, InsightPriority, InsightType, NewInsight};
pub use interaction::{DrugInteraction, InteractionSeverity, NewDrugInteraction};
pub(crate) use interaction::normalize_drug_name;
pub use medication::{Medication, MedicationPatch, NewMedication};
pub use reminder::{MAX_WEEKDAY, MedicationReminder, NewReminder, ReminderPatch, weekday_number};
pub use user::{NewUser, User, UserPatch};

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Entity kinds persisted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    User,
    Medication,
    HealthLog,
    MedicationReminder,
    MedicationLog,
    AiInsight,
    DrugInteraction,
}

impl RecordKind {
    /// Return the kind as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::User => "user",
            RecordKind::Medication => "medication",
            RecordKind::HealthLog => "health_log",
            RecordKind::MedicationReminder => "medication_reminder",
            RecordKind::MedicationLog => "medication_log",
            RecordKind::AiInsight => "ai_insight",
            RecordKind::DrugInteraction => "drug_interaction",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Behavior shared by every stored entity; drives the store's write path.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind tag written to the journal.
    const KIND: RecordKind;

    /// Record identity.
    fn id(&self) -> Uuid;

    /// Stamp creation (and update, for mutable kinds) timestamps.
    fn stamp_created(&mut self, at: DateTime<Utc>);

    /// Stamp the update timestamp; immutable kinds ignore it.
    fn stamp_updated(&mut self, _at: DateTime<Utc>) {}

    /// Check entity-local invariants.
    fn validate(&self) -> Result<(), StoreError>;
}

/// Entities that may carry an expiry instant.
pub trait Expiring: Record {
    fn expires_at(&self) -> Option<DateTime<Utc>>;
}

/// Fail validation when a required text field is blank.
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
