use super::{Record, RecordKind, require_text};
use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use lifelight_rs_protocol::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Device profile owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub medical_conditions: Vec<String>,
    pub allergies: Vec<String>,
}

/// Partial update for a user; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub date_of_birth: Option<Option<NaiveDate>>,
    pub emergency_contact: Option<Option<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub allergies: Option<Vec<String>>,
}

impl User {
    pub(crate) fn from_new(new: NewUser) -> Self {
        let epoch = DateTime::<Utc>::UNIX_EPOCH;
        Self {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            email: normalize_email(&new.email),
            date_of_birth: new.date_of_birth,
            emergency_contact: new.emergency_contact,
            medical_conditions: new.medical_conditions,
            allergies: new.allergies,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    pub(crate) fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if let Some(email) = patch.email {
            self.email = normalize_email(&email);
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
        if let Some(contact) = patch.emergency_contact {
            self.emergency_contact = contact;
        }
        if let Some(conditions) = patch.medical_conditions {
            self.medical_conditions = conditions;
        }
        if let Some(allergies) = patch.allergies {
            self.allergies = allergies;
        }
    }
}

/// Emails compare trimmed and case-insensitively.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Record for User {
    const KIND: RecordKind = RecordKind::User;

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
        require_text("user name", &self.name)?;
        require_text("user email", &self.email)?;
        if !self.email.contains('@') {
            return Err(StoreError::validation(format!(
                "user email is not an address: {}",
                self.email
            )));
        }
        Ok(())
    }
}
