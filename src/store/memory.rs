// In-memory store used when no DATABASE_URL is configured (development and tests)

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::core::errors::AppError;
use crate::core::models::{
    Event, EventChanges, EventId, NewEvent, PasswordHash, Registration, User, UserId,
};
use crate::store::{EventStore, RegistrationLedger, UserStore};

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    events: BTreeMap<EventId, Event>,
    registrations: Vec<Registration>,
    next_user_id: i64,
    next_event_id: i64,
    next_registration_id: i64,
}

impl Tables {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Process-local store with the same constraints as the database schema
///
/// Email and (event, user) uniqueness are checked under the write lock, so
/// concurrent duplicates behave like a unique-constraint race.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_term(event: &Event, needle: &str) -> bool {
    event.name.to_lowercase().contains(needle)
        || event.description.to_lowercase().contains(needle)
        || event.location.to_lowercase().contains(needle)
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
        let mut tables = self.tables.write().await;
        let id = Tables::next_id(&mut tables.next_event_id);
        let stored = Event {
            id,
            name: event.name,
            description: event.description,
            location: event.location,
            date_time: event.date_time,
            user_id: event.user_id,
        };
        tables.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_all(&self) -> Result<Vec<Event>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.events.values().cloned().collect())
    }

    async fn get_by_id(&self, id: EventId) -> Result<Event, AppError> {
        let tables = self.tables.read().await;
        tables
            .events
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("event".to_string()))
    }

    async fn update(&self, id: EventId, changes: EventChanges) -> Result<Event, AppError> {
        let mut tables = self.tables.write().await;
        let event = tables
            .events
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("event".to_string()))?;

        event.name = changes.name;
        event.description = changes.description;
        event.location = changes.location;
        event.date_time = changes.date_time;
        Ok(event.clone())
    }

    async fn delete(&self, id: EventId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        tables.registrations.retain(|r| r.event_id != id);
        Ok(tables.events.remove(&id).is_some())
    }

    async fn search(&self, term: &str) -> Result<Vec<Event>, AppError> {
        let needle = term.to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .values()
            .filter(|event| matches_term(event, &needle))
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl RegistrationLedger for MemoryStore {
    async fn register(&self, event_id: EventId, user_id: UserId) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !tables.events.contains_key(&event_id) {
            return Err(AppError::NotFound("event".to_string()));
        }
        if tables
            .registrations
            .iter()
            .any(|r| r.event_id == event_id && r.user_id == user_id)
        {
            return Err(AppError::DuplicateRegistration { event_id, user_id });
        }

        let id = Tables::next_id(&mut tables.next_registration_id);
        tables.registrations.push(Registration {
            id,
            event_id,
            user_id,
        });
        Ok(())
    }

    async fn unregister(&self, event_id: EventId, user_id: UserId) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        let before = tables.registrations.len();
        tables
            .registrations
            .retain(|r| !(r.event_id == event_id && r.user_id == user_id));
        Ok(tables.registrations.len() < before)
    }

    async fn registrations_for_event(&self, event_id: EventId) -> Result<Vec<Registration>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, email: &str, password_hash: PasswordHash) -> Result<User, AppError> {
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == email) {
            return Err(AppError::EmailTaken);
        }

        let id = Tables::next_id(&mut tables.next_user_id);
        let user = User {
            id,
            email: email.to_string(),
            password_hash,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }
}
