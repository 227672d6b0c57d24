use super::RecordStore;
use crate::error::StoreError;
use crate::records::{Medication, MedicationPatch, NewMedication};
use lifelight_rs_protocol::{MedicationId, UserId};
use log::info;

impl RecordStore {
    /// Add a medication for an existing user.
    pub fn add_medication(&self, new: NewMedication) -> Result<Medication, StoreError> {
        self.require_user(new.user_id)?;
        let medication = Medication::from_new(new, self.today());
        self.create(&self.medications, medication, |_, _| Ok(()))
    }

    pub fn get_medication(&self, id: MedicationId) -> Result<Medication, StoreError> {
        self.medications.get(id)
    }

    pub fn update_medication(
        &self,
        id: MedicationId,
        patch: MedicationPatch,
    ) -> Result<Medication, StoreError> {
        self.update(&self.medications, id, |medication, _| {
            medication.apply(patch);
            Ok(())
        })
    }

    /// Every medication of a user, active or not, by start date.
    pub fn list_medications(&self, user_id: UserId) -> Vec<Medication> {
        let mut medications = self.medications.filter(|medication| medication.user_id == user_id);
        medications.sort_by(|a, b| {
            a.start_date
                .cmp(&b.start_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        medications
    }

    pub fn list_active_medications(&self, user_id: UserId) -> Vec<Medication> {
        let mut medications = self.list_medications(user_id);
        medications.retain(|medication| medication.is_active);
        medications
    }

    /// Soft-delete: mark inactive and end-dated today. History stays intact.
    pub fn deactivate_medication(&self, id: MedicationId) -> Result<Medication, StoreError> {
        let today = self.today();
        let medication = self.update(&self.medications, id, |medication, _| {
            medication.is_active = false;
            let end_date = today.max(medication.start_date);
            medication.end_date.get_or_insert(end_date);
            Ok(())
        })?;
        info!(
            "deactivated medication (medication_id={}, end_date={:?})",
            id, medication.end_date
        );
        Ok(medication)
    }

    /// Undo a deactivation, clearing the end date.
    pub fn reactivate_medication(&self, id: MedicationId) -> Result<Medication, StoreError> {
        self.update(&self.medications, id, |medication, _| {
            medication.is_active = true;
            medication.end_date = None;
            Ok(())
        })
    }

    /// Look up a scanned code against barcodes and NDC numbers.
    pub fn find_medication_by_barcode(&self, barcode: &str) -> Option<Medication> {
        let code = barcode.trim();
        if code.is_empty() {
            return None;
        }
        self.medications.find(|medication| {
            medication.barcode.as_deref() == Some(code)
                || medication.ndc_number.as_deref() == Some(code)
        })
    }

    /// Case-insensitive substring search over name and generic name.
    pub fn search_medications(&self, query: &str, user_id: Option<UserId>) -> Vec<Medication> {
        let needle = query.trim().to_lowercase();
        let mut matches = self.medications.filter(|medication| {
            user_id.is_none_or(|owner| medication.user_id == owner) && medication.matches(&needle)
        });
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches
    }
}
