use super::{Record, RecordKind, require_text};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use lifelight_rs_protocol::InteractionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionSeverity {
    Mild,
    Moderate,
    Severe,
}

/// Known interaction between two medications, keyed by lowercase name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugInteraction {
    pub id: InteractionId,
    pub medication1: String,
    pub medication2: String,
    pub severity: InteractionSeverity,
    pub description: String,
    #[serde(default)]
    pub recommendation: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDrugInteraction {
    pub medication1: String,
    pub medication2: String,
    pub severity: InteractionSeverity,
    pub description: String,
    pub recommendation: Option<String>,
    pub source: Option<String>,
}

impl DrugInteraction {
    pub(crate) fn from_new(new: NewDrugInteraction) -> Self {
        Self {
            id: Uuid::new_v4(),
            medication1: normalize_drug_name(&new.medication1),
            medication2: normalize_drug_name(&new.medication2),
            severity: new.severity,
            description: new.description,
            recommendation: new.recommendation,
            source: new.source,
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// True when this interaction links the two names, in either order.
    pub fn involves(&self, first: &str, second: &str) -> bool {
        (self.medication1 == first && self.medication2 == second)
            || (self.medication1 == second && self.medication2 == first)
    }
}

pub(crate) fn normalize_drug_name(name: &str) -> String {
    name.trim().to_lowercase()
}

impl Record for DrugInteraction {
    const KIND: RecordKind = RecordKind::DrugInteraction;

    fn id(&self) -> Uuid {
        self.id
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn validate(&self) -> Result<(), StoreError> {
        require_text("interacting medication", &self.medication1)?;
        require_text("interacting medication", &self.medication2)?;
        if self.medication1 == self.medication2 {
            return Err(StoreError::validation(format!(
                "a medication cannot interact with itself: {}",
                self.medication1
            )));
        }
        Ok(())
    }
}
