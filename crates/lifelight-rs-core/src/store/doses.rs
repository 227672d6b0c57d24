use super::{RecordStore, truncate};
use crate::error::StoreError;
use crate::records::{MedicationLog, NewMedicationLog};
use lifelight_rs_protocol::{MedicationId, MedicationLogId, UserId};
use log::debug;

impl RecordStore {
    /// Append a dose-taken entry for a medication the user owns.
    pub fn log_medication_taken(&self, new: NewMedicationLog) -> Result<MedicationLog, StoreError> {
        self.require_user(new.user_id)?;
        let medication = self.get_medication(new.medication_id)?;
        if medication.user_id != new.user_id {
            return Err(StoreError::validation(format!(
                "medication {} does not belong to user {}",
                medication.id, new.user_id
            )));
        }
        let log = MedicationLog::from_new(new, self.clock.now_utc(), &medication.dosage);
        let log = self.create(&self.medication_logs, log, |_, _| Ok(()))?;
        debug!(
            "logged dose (medication_id={}, taken_at={})",
            log.medication_id, log.taken_at
        );
        Ok(log)
    }

    pub fn get_medication_log(&self, id: MedicationLogId) -> Result<MedicationLog, StoreError> {
        self.medication_logs.get(id)
    }

    /// A user's dose entries, newest first.
    pub fn list_medication_logs(&self, user_id: UserId, limit: Option<usize>) -> Vec<MedicationLog> {
        let mut logs = self.medication_logs.filter(|log| log.user_id == user_id);
        logs.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        truncate(logs, limit)
    }

    /// Dose entries for one medication, newest first.
    pub fn medication_logs_for(&self, medication_id: MedicationId) -> Vec<MedicationLog> {
        let mut logs = self
            .medication_logs
            .filter(|log| log.medication_id == medication_id);
        logs.sort_by(|a, b| b.taken_at.cmp(&a.taken_at));
        logs
    }
}
