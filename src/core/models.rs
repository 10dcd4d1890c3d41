// Domain models shared by the store, engine and API layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::errors::AppError;

pub type UserId = i64;
pub type EventId = i64;

/// Scheduled event owned by the user who created it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
    /// Owner. Set from the principal at creation, never changed afterwards.
    pub user_id: UserId,
}

/// Event about to be persisted; the store assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
    pub user_id: UserId,
}

/// Mutable fields of an event (full replace on update)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChanges {
    pub name: String,
    pub description: String,
    pub location: String,
    pub date_time: DateTime<Utc>,
}

impl EventChanges {
    /// Attach an owner, producing a record ready for insertion
    pub fn owned_by(self, user_id: UserId) -> NewEvent {
        NewEvent {
            name: self.name,
            description: self.description,
            location: self.location,
            date_time: self.date_time,
            user_id,
        }
    }
}

/// Request body for creating or updating an event
///
/// Any `id` or `userId` sent by the client is ignored: the id comes from the
/// path and the owner from the principal.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub date_time: Option<DateTime<Utc>>,
}

impl EventInput {
    /// Check required fields and trim surrounding whitespace
    pub fn validate(self) -> Result<EventChanges, AppError> {
        let name = required("name", self.name)?;
        let description = required("description", self.description)?;
        let location = required("location", self.location)?;
        let date_time = self
            .date_time
            .ok_or_else(|| AppError::Validation("dateTime is required".to_string()))?;

        Ok(EventChanges {
            name,
            description,
            location,
            date_time,
        })
    }
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// Encoded Argon2 hash as stored in the users table
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(<REDACTED>)")
    }
}

/// Stored user account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// Public projection of a user (never includes the hash)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserView {
    pub id: UserId,
    pub email: String,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
        }
    }
}

/// Signup / login request body
#[derive(Deserialize)]
pub struct CredentialsInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// A user's registration for an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Authenticated identity resolved by the auth middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub email: String,
}
