use super::RecordStore;
use crate::error::StoreError;
use crate::records::{NewUser, User, UserPatch};
use lifelight_rs_protocol::UserId;
use std::collections::HashMap;
use uuid::Uuid;

impl RecordStore {
    pub fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        self.create(&self.users, User::from_new(new), ensure_unique_email)
    }

    pub fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        self.users.get(id)
    }

    pub fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, StoreError> {
        self.update(&self.users, id, |user, users| {
            user.apply(patch);
            ensure_unique_email(users, user)
        })
    }

    /// All users, oldest first.
    pub fn list_users(&self) -> Vec<User> {
        let mut users = self.users.filter(|_| true);
        users.sort_by_key(|user| user.created_at);
        users
    }
}

fn ensure_unique_email(users: &HashMap<Uuid, User>, candidate: &User) -> Result<(), StoreError> {
    let taken = users
        .values()
        .any(|user| user.id != candidate.id && user.email == candidate.email);
    if taken {
        return Err(StoreError::validation(format!(
            "email already registered: {}",
            candidate.email
        )));
    }
    Ok(())
}
