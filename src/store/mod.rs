// Persistence layer: repository traits plus PostgreSQL and in-memory backends

use async_trait::async_trait;

use crate::core::errors::AppError;
use crate::core::models::{
    Event, EventChanges, EventId, NewEvent, PasswordHash, Registration, User, UserId,
};

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// CRUD and search over events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event and return it with its assigned id
    async fn create(&self, event: NewEvent) -> Result<Event, AppError>;

    /// All events ordered by id; empty is not an error
    async fn get_all(&self) -> Result<Vec<Event>, AppError>;

    /// Fails with `NotFound` when no event has this id
    async fn get_by_id(&self, id: EventId) -> Result<Event, AppError>;

    /// Replace the mutable fields of an event. The owner is left untouched.
    async fn update(&self, id: EventId, changes: EventChanges) -> Result<Event, AppError>;

    /// Delete an event together with its registrations.
    /// Returns `false` when there was nothing to delete.
    async fn delete(&self, id: EventId) -> Result<bool, AppError>;

    /// Case-insensitive substring match on name, description or location
    async fn search(&self, term: &str) -> Result<Vec<Event>, AppError>;

    /// Connectivity check used by the health endpoint
    async fn ping(&self) -> Result<(), AppError>;
}

/// Event <-> user registration relation
#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    /// Insert a registration. A repeat fails with `DuplicateRegistration`.
    ///
    /// Existence of the event is the caller's responsibility.
    async fn register(&self, event_id: EventId, user_id: UserId) -> Result<(), AppError>;

    /// Remove a registration. Returns `false` when none existed.
    async fn unregister(&self, event_id: EventId, user_id: UserId) -> Result<bool, AppError>;

    async fn registrations_for_event(&self, event_id: EventId) -> Result<Vec<Registration>, AppError>;
}

/// User accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Create a user. A taken email fails with `EmailTaken`.
    async fn create(&self, email: &str, password_hash: PasswordHash) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}
