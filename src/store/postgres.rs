// PostgreSQL-backed stores

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;

use crate::core::errors::AppError;
use crate::core::models::{
    Event, EventChanges, EventId, NewEvent, PasswordHash, Registration, User, UserId,
};
use crate::store::{EventStore, RegistrationLedger, UserStore};

const EVENT_COLUMNS: &str = "id, name, description, location, date_time, user_id";

/// Database row structure for events
#[derive(FromRow)]
struct EventRow {
    id: i64,
    name: String,
    description: String,
    location: String,
    date_time: DateTime<Utc>,
    user_id: i64,
}

impl From<EventRow> for Event {
    fn from(r: EventRow) -> Self {
        Event {
            id: r.id,
            name: r.name,
            description: r.description,
            location: r.location,
            date_time: r.date_time,
            user_id: r.user_id,
        }
    }
}

#[derive(FromRow)]
struct UserRow {
    id: i64,
    email: String,
    password_hash: String,
}

#[derive(FromRow)]
struct RegistrationRow {
    id: i64,
    event_id: i64,
    user_id: i64,
}

/// Store backed by a PostgreSQL connection pool
///
/// The pool is injected at construction; each call checks a connection out
/// for the duration of one statement or transaction.
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }
}

fn persistence(context: &str, e: sqlx::Error) -> AppError {
    AppError::Persistence(format!("{}: {}", context, e))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

/// Escape LIKE metacharacters so the term is matched literally
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[async_trait]
impl EventStore for PgStore {
    async fn create(&self, event: NewEvent) -> Result<Event, AppError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "INSERT INTO events (name, description, location, date_time, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&event.name)
        .bind(&event.description)
        .bind(&event.location)
        .bind(event.date_time)
        .bind(event.user_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to insert event", e))?;

        Ok(row.into())
    }

    async fn get_all(&self) -> Result<Vec<Event>, AppError> {
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events ORDER BY id",
            EVENT_COLUMNS
        ))
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to fetch events", e))?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn get_by_id(&self, id: EventId) -> Result<Event, AppError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events WHERE id = $1",
            EVENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to fetch event", e))?;

        row.map(Event::from)
            .ok_or_else(|| AppError::NotFound("event".to_string()))
    }

    async fn update(&self, id: EventId, changes: EventChanges) -> Result<Event, AppError> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "UPDATE events
             SET name = $1, description = $2, location = $3, date_time = $4
             WHERE id = $5
             RETURNING {}",
            EVENT_COLUMNS
        ))
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.location)
        .bind(changes.date_time)
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to update event", e))?;

        row.map(Event::from)
            .ok_or_else(|| AppError::NotFound("event".to_string()))
    }

    async fn delete(&self, id: EventId) -> Result<bool, AppError> {
        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| persistence("Failed to begin transaction", e))?;

        let removed_registrations = sqlx::query("DELETE FROM registrations WHERE event_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| persistence("Failed to delete registrations", e))?
            .rows_affected();

        let removed = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| persistence("Failed to delete event", e))?
            .rows_affected();

        tx.commit()
            .await
            .map_err(|e| persistence("Failed to commit event deletion", e))?;

        debug!(event_id = id, removed_registrations, "Event deleted");
        Ok(removed > 0)
    }

    async fn search(&self, term: &str) -> Result<Vec<Event>, AppError> {
        let pattern = like_pattern(term);
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {} FROM events
             WHERE name ILIKE $1 ESCAPE '\\'
                OR description ILIKE $1 ESCAPE '\\'
                OR location ILIKE $1 ESCAPE '\\'
             ORDER BY id",
            EVENT_COLUMNS
        ))
        .bind(pattern)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to search events", e))?;

        Ok(rows.into_iter().map(Event::from).collect())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map(|_| ())
            .map_err(|e| persistence("Database ping failed", e))
    }
}

#[async_trait]
impl RegistrationLedger for PgStore {
    async fn register(&self, event_id: EventId, user_id: UserId) -> Result<(), AppError> {
        sqlx::query("INSERT INTO registrations (event_id, user_id) VALUES ($1, $2)")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::DuplicateRegistration { event_id, user_id }
                } else if is_foreign_key_violation(&e) {
                    AppError::NotFound("event".to_string())
                } else {
                    persistence("Failed to insert registration", e)
                }
            })?;

        Ok(())
    }

    async fn unregister(&self, event_id: EventId, user_id: UserId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM registrations WHERE event_id = $1 AND user_id = $2")
            .bind(event_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await
            .map_err(|e| persistence("Failed to delete registration", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn registrations_for_event(&self, event_id: EventId) -> Result<Vec<Registration>, AppError> {
        let rows = sqlx::query_as::<_, RegistrationRow>(
            "SELECT id, event_id, user_id FROM registrations WHERE event_id = $1 ORDER BY id",
        )
        .bind(event_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to fetch registrations", e))?;

        Ok(rows
            .into_iter()
            .map(|r| Registration {
                id: r.id,
                event_id: r.event_id,
                user_id: r.user_id,
            })
            .collect())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, email: &str, password_hash: PasswordHash) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2)
             RETURNING id, email, password_hash",
        )
        .bind(email)
        .bind(password_hash.as_str())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::EmailTaken
            } else {
                persistence("Failed to insert user", e)
            }
        })?;

        Ok(User {
            id: row.id,
            email: row.email,
            password_hash: PasswordHash::new(row.password_hash),
        })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| persistence("Failed to fetch user", e))?;

        Ok(row.map(|r| User {
            id: r.id,
            email: r.email,
            password_hash: PasswordHash::new(r.password_hash),
        }))
    }
}
