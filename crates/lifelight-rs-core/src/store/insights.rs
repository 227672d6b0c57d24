use super::RecordStore;
use crate::error::StoreError;
use crate::records::{AiInsight, Expiring, NewInsight};
use chrono::{DateTime, Utc};
use lifelight_rs_protocol::{InsightId, UserId};
use log::info;

impl RecordStore {
    pub fn add_insight(&self, new: NewInsight) -> Result<AiInsight, StoreError> {
        self.require_user(new.user_id)?;
        self.create(&self.insights, AiInsight::from_new(new), |_, _| Ok(()))
    }

    pub fn get_insight(&self, id: InsightId) -> Result<AiInsight, StoreError> {
        self.insights.get(id)
    }

    /// A user's insights, newest first.
    pub fn list_insights(&self, user_id: UserId, unread_only: bool) -> Vec<AiInsight> {
        let mut insights = self
            .insights
            .filter(|insight| insight.user_id == user_id && (!unread_only || !insight.is_read));
        insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        insights
    }

    pub fn mark_insight_read(&self, id: InsightId) -> Result<AiInsight, StoreError> {
        self.update(&self.insights, id, |insight, _| {
            insight.is_read = true;
            Ok(())
        })
    }

    pub(super) fn purge_expired_insights(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let removed = self.remove_where(&self.insights, |insight| {
            insight.expires_at().is_some_and(|expires_at| expires_at < now)
        })?;
        if removed > 0 {
            info!("purged expired insights (count={})", removed);
        }
        Ok(removed)
    }
}
