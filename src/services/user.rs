//! User service

use chrono::Utc;

use crate::error::{SimulottoError, SimulottoResult};
use crate::models::{User, UserId};
use crate::storage::Storage;

/// Service for user management
pub struct UserService<'a> {
    storage: &'a Storage,
}

impl<'a> UserService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Register a new user
    pub fn create(&self, name: &str, email: &str) -> SimulottoResult<User> {
        let email = email.trim().to_lowercase();

        if self.find_by_email(&email)?.is_some() {
            return Err(SimulottoError::Duplicate {
                entity_type: "User",
                identifier: email,
            });
        }

        let user = User::new(name.trim(), email);
        user.validate()
            .map_err(|e| SimulottoError::Validation(e.to_string()))?;

        self.storage.users.insert(user)
    }

    pub fn get(&self, id: UserId) -> SimulottoResult<Option<User>> {
        self.storage.users.get(id)
    }

    /// Find a user by id or email
    pub fn find(&self, identifier: &str) -> SimulottoResult<Option<User>> {
        if let Some(user) = self.storage.users.find(identifier)? {
            return Ok(Some(user));
        }
        self.find_by_email(identifier)
    }

    fn find_by_email(&self, email: &str) -> SimulottoResult<Option<User>> {
        let email = email.trim().to_lowercase();
        Ok(self
            .storage
            .users
            .list()?
            .into_iter()
            .find(|u| u.email == email))
    }

    pub fn list(&self) -> SimulottoResult<Vec<User>> {
        self.storage.users.list()
    }

    /// Change a user's display name
    pub fn rename(&self, id: UserId, name: &str) -> SimulottoResult<User> {
        self.storage.users.update(id, |user| {
            user.name = name.trim().to_string();
            user.updated_at = Utc::now();
            user.validate()
                .map_err(|e| SimulottoError::Validation(e.to_string()))
        })
    }

    /// Delete a user that has no bets
    pub fn delete(&self, id: UserId) -> SimulottoResult<User> {
        let has_bets = self
            .storage
            .bets
            .list()?
            .iter()
            .any(|b| b.user_id == id);
        if has_bets {
            return Err(SimulottoError::Validation(format!(
                "User {} still has bets",
                id
            )));
        }

        self.storage.users.delete(id).map_err(|e| match e {
            SimulottoError::NotFound { .. } => SimulottoError::user_not_found(id.to_string()),
            other => other,
        })
    }
}
