use super::RecordStore;
use crate::error::StoreError;
use crate::records::{MedicationReminder, NewReminder, ReminderPatch};
use chrono::{DateTime, Utc};
use lifelight_rs_protocol::{MedicationId, ReminderId, UserId};
use log::info;

impl RecordStore {
    /// Add a reminder for an active medication owned by the same user.
    pub fn add_reminder(&self, new: NewReminder) -> Result<MedicationReminder, StoreError> {
        self.require_user(new.user_id)?;
        let medication = self.get_medication(new.medication_id)?;
        if medication.user_id != new.user_id {
            return Err(StoreError::validation(format!(
                "medication {} does not belong to user {}",
                medication.id, new.user_id
            )));
        }
        if !medication.is_active {
            return Err(StoreError::validation(format!(
                "medication {} is inactive",
                medication.id
            )));
        }
        let reminder = MedicationReminder::from_new(new);
        self.create(&self.reminders, reminder, |_, _| Ok(()))
    }

    pub fn get_reminder(&self, id: ReminderId) -> Result<MedicationReminder, StoreError> {
        self.reminders.get(id)
    }

    pub fn update_reminder(
        &self,
        id: ReminderId,
        patch: ReminderPatch,
    ) -> Result<MedicationReminder, StoreError> {
        self.update(&self.reminders, id, |reminder, _| {
            reminder.apply(patch);
            Ok(())
        })
    }

    /// Enable or disable a reminder.
    pub fn set_reminder_active(
        &self,
        id: ReminderId,
        is_active: bool,
    ) -> Result<MedicationReminder, StoreError> {
        self.update_reminder(
            id,
            ReminderPatch {
                is_active: Some(is_active),
                ..ReminderPatch::default()
            },
        )
    }

    pub fn remove_reminder(&self, id: ReminderId) -> Result<MedicationReminder, StoreError> {
        let removed = self.remove(&self.reminders, id)?;
        info!("removed reminder (reminder_id={})", id);
        Ok(removed)
    }

    /// A user's reminders ordered by time of day.
    pub fn list_reminders(&self, user_id: UserId) -> Vec<MedicationReminder> {
        let mut reminders = self.reminders.filter(|reminder| reminder.user_id == user_id);
        reminders.sort_by(|a, b| a.time.cmp(&b.time).then(a.created_at.cmp(&b.created_at)));
        reminders
    }

    pub fn list_active_reminders(&self, user_id: UserId) -> Vec<MedicationReminder> {
        let mut reminders = self.list_reminders(user_id);
        reminders.retain(|reminder| reminder.is_active);
        reminders
    }

    pub fn reminders_for_medication(&self, medication_id: MedicationId) -> Vec<MedicationReminder> {
        let mut reminders = self
            .reminders
            .filter(|reminder| reminder.medication_id == medication_id);
        reminders.sort_by(|a, b| a.time.cmp(&b.time));
        reminders
    }

    /// Record that the scheduler fired this reminder.
    pub(crate) fn mark_reminder_triggered(
        &self,
        id: ReminderId,
        at: DateTime<Utc>,
    ) -> Result<MedicationReminder, StoreError> {
        self.update(&self.reminders, id, |reminder, _| {
            reminder.last_triggered = Some(at);
            Ok(())
        })
    }
}
