// Security event logging

use sqlx::PgPool;
use tracing::{info, warn};

use crate::core::models::UserId;

/// Authentication event type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignupSuccess,
    LoginSuccess,
    LoginFailure { reason: String },
    TokenAccepted,
    TokenRejected { reason: String },
}

impl AuthEvent {
    /// Value stored in the `event_type` column
    pub fn event_type(&self) -> &'static str {
        match self {
            AuthEvent::SignupSuccess => "SIGNUP_SUCCESS",
            AuthEvent::LoginSuccess => "LOGIN_SUCCESS",
            AuthEvent::LoginFailure { .. } => "LOGIN_FAILURE",
            AuthEvent::TokenAccepted => "TOKEN_ACCEPTED",
            AuthEvent::TokenRejected { .. } => "TOKEN_REJECTED",
        }
    }

    /// Whether the event is written to `auth_audit_log`
    ///
    /// Token checks run on every protected request and can be triggered by
    /// unauthenticated clients, so they are only traced.
    pub fn is_persisted(&self) -> bool {
        matches!(
            self,
            AuthEvent::SignupSuccess | AuthEvent::LoginSuccess | AuthEvent::LoginFailure { .. }
        )
    }

    fn reason(&self) -> Option<&str> {
        match self {
            AuthEvent::LoginFailure { reason } | AuthEvent::TokenRejected { reason } => {
                Some(reason.as_str())
            }
            _ => None,
        }
    }
}

/// Who and where an auth event came from
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Audit logger for security events
pub struct AuditLogger {
    db_pool: Option<PgPool>,
}

impl AuditLogger {
    /// Create a new audit logger
    ///
    /// If `db_pool` is `None`, only structured logging will be used (no database persistence).
    pub fn new(db_pool: Option<PgPool>) -> Self {
        Self { db_pool }
    }

    /// Log an authentication event
    ///
    /// Fire-and-forget: the database write runs on a spawned task and its
    /// failure never affects the request. Only signup and login events are
    /// persisted; see [`AuthEvent::is_persisted`].
    pub fn log_auth_event(&self, event: AuthEvent, context: AuthContext) {
        match &event {
            AuthEvent::LoginFailure { reason } | AuthEvent::TokenRejected { reason } => {
                warn!(
                    event_type = event.event_type(),
                    user_id = ?context.user_id,
                    ip_address = ?context.ip_address,
                    user_agent = ?context.user_agent,
                    reason = %reason,
                    "Authentication failed"
                );
            }
            _ => {
                info!(
                    event_type = event.event_type(),
                    user_id = ?context.user_id,
                    ip_address = ?context.ip_address,
                    user_agent = ?context.user_agent,
                    "Authentication succeeded"
                );
            }
        }

        if !event.is_persisted() {
            return;
        }

        let Some(pool) = self.db_pool.clone() else {
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = sqlx::query(
                "INSERT INTO auth_audit_log (user_id, email, event_type, reason, ip_address, user_agent, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, NOW())",
            )
            .bind(context.user_id)
            .bind(&context.email)
            .bind(event.event_type())
            .bind(event.reason())
            .bind(&context.ip_address)
            .bind(&context.user_agent)
            .execute(&pool)
            .await
            {
                warn!(error = %e, "Failed to write audit log to database");
            }
        });
    }
}
