use super::{Record, RecordKind, require_text};
use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use lifelight_rs_protocol::{MedicationId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication on a user's list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: MedicationId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub generic_name: Option<String>,
    pub dosage: String,
    /// Free-text schedule description, e.g. "twice daily".
    pub frequency: String,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub prescribed_by: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    #[serde(default)]
    pub ndc_number: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new medication.
///
/// A medication added with an `end_date` is stored inactive.
#[derive(Debug, Clone, Default)]
pub struct NewMedication {
    pub user_id: UserId,
    pub name: String,
    pub generic_name: Option<String>,
    pub dosage: String,
    pub frequency: String,
    pub instructions: Option<String>,
    pub prescribed_by: Option<String>,
    /// Defaults to the store clock's local date.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub ndc_number: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub side_effects: Vec<String>,
}

/// Partial update for a medication. Activity is changed through
/// `deactivate_medication`/`reactivate_medication` only.
#[derive(Debug, Clone, Default)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub generic_name: Option<Option<String>>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub instructions: Option<Option<String>>,
    pub prescribed_by: Option<Option<String>>,
    pub ndc_number: Option<Option<String>>,
    pub barcode: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub side_effects: Option<Vec<String>>,
}

impl Medication {
    pub(crate) fn from_new(new: NewMedication, today: NaiveDate) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            name: new.name.trim().to_string(),
            generic_name: new.generic_name,
            dosage: new.dosage.trim().to_string(),
            frequency: new.frequency,
            instructions: new.instructions,
            prescribed_by: new.prescribed_by,
            start_date: new.start_date.unwrap_or(today),
            is_active: new.end_date.is_none(),
            end_date: new.end_date,
            ndc_number: new.ndc_number,
            barcode: new.barcode,
            description: new.description,
            side_effects: new.side_effects,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    pub(crate) fn apply(&mut self, patch: MedicationPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(generic_name) = patch.generic_name {
            self.generic_name = generic_name;
        }
        if let Some(dosage) = patch.dosage {
            self.dosage = dosage.trim().to_string();
        }
        if let Some(frequency) = patch.frequency {
            self.frequency = frequency;
        }
        if let Some(instructions) = patch.instructions {
            self.instructions = instructions;
        }
        if let Some(prescribed_by) = patch.prescribed_by {
            self.prescribed_by = prescribed_by;
        }
        if let Some(ndc_number) = patch.ndc_number {
            self.ndc_number = ndc_number;
        }
        if let Some(barcode) = patch.barcode {
            self.barcode = barcode;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(side_effects) = patch.side_effects {
            self.side_effects = side_effects;
        }
    }

    /// Case-insensitive substring match over name and generic name.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self
                .generic_name
                .as_deref()
                .is_some_and(|generic| generic.to_lowercase().contains(needle))
    }
}

impl Record for Medication {
    const KIND: RecordKind = RecordKind::Medication;

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
        require_text("medication name", &self.name)?;
        require_text("medication dosage", &self.dosage)?;
        if self.end_date.is_some() && self.is_active {
            return Err(StoreError::validation(
                "an end-dated medication cannot be active",
            ));
        }
        if let Some(end_date) = self.end_date
            && end_date < self.start_date
        {
            return Err(StoreError::validation(format!(
                "medication end date {end_date} precedes start date {}",
                self.start_date
            )));
        }
        Ok(())
    }
}
