use super::{Record, RecordKind, require_text};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use lifelight_rs_protocol::{MedicationId, MedicationLogId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A dose actually taken. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationLog {
    pub id: MedicationLogId,
    pub user_id: UserId,
    pub medication_id: MedicationId,
    pub taken_at: DateTime<Utc>,
    pub dosage_taken: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Logged in response to a reminder notification.
    #[serde(default)]
    pub reminded: bool,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a dose-taken entry.
#[derive(Debug, Clone, Default)]
pub struct NewMedicationLog {
    pub user_id: UserId,
    pub medication_id: MedicationId,
    /// Defaults to the store clock's now.
    pub taken_at: Option<DateTime<Utc>>,
    /// Defaults to the medication's dosage.
    pub dosage_taken: Option<String>,
    pub notes: Option<String>,
    pub reminded: bool,
}

impl MedicationLog {
    pub(crate) fn from_new(new: NewMedicationLog, now: DateTime<Utc>, dosage: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            medication_id: new.medication_id,
            taken_at: new.taken_at.unwrap_or(now),
            dosage_taken: new.dosage_taken.unwrap_or_else(|| dosage.to_string()),
            notes: new.notes,
            reminded: new.reminded,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl Record for MedicationLog {
    const KIND: RecordKind = RecordKind::MedicationLog;

    fn id(&self) -> Uuid {
        self.id
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require_text("dosage taken", &self.dosage_taken)
    }
}
