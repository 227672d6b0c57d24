use super::{RecordStore, truncate};
use crate::error::StoreError;
use crate::records::{HealthLog, NewHealthLog};
use chrono::NaiveDate;
use lifelight_rs_protocol::{HealthLogId, UserId};

impl RecordStore {
    pub fn add_health_log(&self, new: NewHealthLog) -> Result<HealthLog, StoreError> {
        self.require_user(new.user_id)?;
        let log = HealthLog::from_new(new, self.today());
        self.create(&self.health_logs, log, |_, _| Ok(()))
    }

    pub fn get_health_log(&self, id: HealthLogId) -> Result<HealthLog, StoreError> {
        self.health_logs.get(id)
    }

    /// A user's health logs, newest first.
    pub fn list_health_logs(&self, user_id: UserId, limit: Option<usize>) -> Vec<HealthLog> {
        let mut logs = self.health_logs.filter(|log| log.user_id == user_id);
        logs.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        truncate(logs, limit)
    }

    /// Logs dated within `start..=end`, oldest first.
    pub fn health_logs_between(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<HealthLog> {
        let mut logs = self
            .health_logs
            .filter(|log| log.user_id == user_id && log.date >= start && log.date <= end);
        logs.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        logs
    }
}
