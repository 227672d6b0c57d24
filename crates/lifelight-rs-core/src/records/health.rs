use super::{Record, RecordKind};
use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use lifelight_rs_protocol::{HealthLogId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Highest accepted health score.
pub const MAX_HEALTH_SCORE: u8 = 100;

/// Optional vital-sign readings attached to a health log.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    /// Free-form reading such as "120/80".
    #[serde(default)]
    pub blood_pressure: Option<String>,
    #[serde(default)]
    pub heart_rate: Option<u16>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl VitalSigns {
    /// True when no reading is present.
    pub fn is_empty(&self) -> bool {
        self.blood_pressure.is_none()
            && self.heart_rate.is_none()
            && self.weight.is_none()
            && self.temperature.is_none()
    }
}

/// Dated health snapshot. Immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthLog {
    pub id: HealthLogId,
    pub user_id: UserId,
    pub date: NaiveDate,
    pub health_score: u8,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub medications_taken: Vec<String>,
    #[serde(default)]
    pub vital_signs: Option<VitalSigns>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new health log.
#[derive(Debug, Clone, Default)]
pub struct NewHealthLog {
    pub user_id: UserId,
    /// Defaults to the store clock's local date.
    pub date: Option<NaiveDate>,
    pub health_score: u8,
    pub symptoms: Vec<String>,
    pub notes: Option<String>,
    pub medications_taken: Vec<String>,
    pub vital_signs: Option<VitalSigns>,
}

impl HealthLog {
    pub(crate) fn from_new(new: NewHealthLog, today: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            date: new.date.unwrap_or(today),
            health_score: new.health_score,
            symptoms: new.symptoms,
            notes: new.notes,
            medications_taken: new.medications_taken,
            vital_signs: new.vital_signs.filter(|vitals| !vitals.is_empty()),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    /// True when at least one vital-sign reading was recorded.
    pub fn has_vital_signs(&self) -> bool {
        self.vital_signs.as_ref().is_some_and(|vitals| !vitals.is_empty())
    }
}

impl Record for HealthLog {
    const KIND: RecordKind = RecordKind::HealthLog;

    fn id(&self) -> Uuid {
        self.id
    }

    fn stamp_created(&mut self, at: DateTime<Utc>) {
        self.created_at = at;
    }

    fn validate(&self) -> Result<(), StoreError> {
        if self.health_score > MAX_HEALTH_SCORE {
            return Err(StoreError::validation(format!(
                "health score {} exceeds {MAX_HEALTH_SCORE}",
                self.health_score
            )));
        }
        Ok(())
    }
}
