// Schema bootstrap: tables are created idempotently at startup

use sqlx::PgPool;
use tracing::info;

use crate::core::errors::AppError;

const CREATE_USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL
)";

const CREATE_EVENTS: &str = "
CREATE TABLE IF NOT EXISTS events (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT NOT NULL,
    location TEXT NOT NULL,
    date_time TIMESTAMPTZ NOT NULL,
    user_id BIGINT NOT NULL REFERENCES users(id)
)";

// No ON DELETE CASCADE: event deletion removes registrations explicitly
const CREATE_REGISTRATIONS: &str = "
CREATE TABLE IF NOT EXISTS registrations (
    id BIGSERIAL PRIMARY KEY,
    event_id BIGINT NOT NULL REFERENCES events(id),
    user_id BIGINT NOT NULL REFERENCES users(id),
    CONSTRAINT registrations_event_user_key UNIQUE (event_id, user_id)
)";

const CREATE_AUTH_AUDIT_LOG: &str = "
CREATE TABLE IF NOT EXISTS auth_audit_log (
    id BIGSERIAL PRIMARY KEY,
    user_id BIGINT,
    email TEXT,
    event_type TEXT NOT NULL,
    reason TEXT,
    ip_address TEXT,
    user_agent TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
)";

/// Create all tables if they do not exist yet
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for statement in [
        CREATE_USERS,
        CREATE_EVENTS,
        CREATE_REGISTRATIONS,
        CREATE_AUTH_AUDIT_LOG,
    ] {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| AppError::Persistence(format!("Schema creation failed: {}", e)))?;
    }

    info!("Database schema ready");
    Ok(())
}
