use super::{Expiring, Record, RecordKind, require_text};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use lifelight_rs_protocol::{InsightId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic of a stored insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Medication,
    Health,
    Interaction,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightPriority {
    Low,
    Medium,
    High,
}

/// Externally generated advice note kept for the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiInsight {
    pub id: InsightId,
    pub user_id: UserId,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub content: String,
    pub priority: InsightPriority,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInsight {
    pub user_id: UserId,
    pub insight_type: InsightType,
    pub title: String,
    pub content: String,
    pub priority: InsightPriority,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AiInsight {
    pub(crate) fn from_new(new: NewInsight) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            insight_type: new.insight_type,
            title: new.title.trim().to_string(),
            content: new.content,
            priority: new.priority,
            is_read: false,
            expires_at: new.expires_at,
            created_at: epoch,
            updated_at: epoch,
        }
    }
}

impl Record for AiInsight {
    const KIND: RecordKind = RecordKind::AiInsight;

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
        require_text("insight title", &self.title)
    }
}

impl Expiring for AiInsight {
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}
