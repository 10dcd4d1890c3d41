// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer,
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    BoxError, Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::auth::audit_logger::AuditLogger;
use crate::auth::auth_middleware::{auth_middleware, AuthState};
use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenService;
use crate::config::Config;
use crate::store::{EventStore, MemoryStore, PgStore, RegistrationLedger, UserStore};
use responses::ApiError;

/// Application state containing all shared dependencies
///
/// All components are wrapped in Arc for shared ownership across async tasks.
/// Stores are injected here once at startup; handlers never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub events: Arc<dyn EventStore>,
    pub registrations: Arc<dyn RegistrationLedger>,
    pub users: Arc<dyn UserStore>,
    pub token_service: Arc<TokenService>,
    pub password_hasher: PasswordHasher,
    pub audit_logger: Arc<AuditLogger>,
    pub config: Arc<Config>,
}

impl AppState {
    /// State backed by a PostgreSQL pool
    pub fn with_postgres(db_pool: PgPool, config: Config) -> Self {
        let store = Arc::new(PgStore::new(db_pool.clone()));
        Self::build(
            store.clone(),
            store.clone(),
            store,
            AuditLogger::new(Some(db_pool)),
            config,
        )
    }

    /// State backed by the in-memory store
    pub fn with_memory_store(config: Config) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::build(
            store.clone(),
            store.clone(),
            store,
            AuditLogger::new(None),
            config,
        )
    }

    /// Assemble state from explicit store implementations
    pub fn build(
        events: Arc<dyn EventStore>,
        registrations: Arc<dyn RegistrationLedger>,
        users: Arc<dyn UserStore>,
        audit_logger: AuditLogger,
        config: Config,
    ) -> Self {
        Self {
            events,
            registrations,
            users,
            token_service: Arc::new(TokenService::from_config(&config)),
            password_hasher: PasswordHasher::with_cost(
                config.password_hash_memory_kib,
                config.password_hash_iterations,
            ),
            audit_logger: Arc::new(audit_logger),
            config: Arc::new(config),
        }
    }

    /// Dependencies of the auth middleware
    pub fn auth_state(&self) -> AuthState {
        AuthState {
            token_service: self.token_service.clone(),
            audit_logger: self.audit_logger.clone(),
        }
    }
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Tracing (tower-http::trace)
/// - CORS (tower-http::cors) - configured origins only
/// - Request timeout (tower::timeout) - 408 on expiry
/// - Body size limit (tower-http::limit)
/// - Auth middleware - applied to protected routes only, via route_layer
pub fn create_router(app_state: AppState) -> Router {
    let protected = Router::new()
        .route("/events", post(handlers::create_event_handler))
        .route(
            "/events/:id",
            put(handlers::update_event_handler).delete(handlers::delete_event_handler),
        )
        .route(
            "/events/:id/register",
            post(handlers::register_handler).delete(handlers::cancel_registration_handler),
        )
        .route(
            "/events/:id/registrations",
            get(handlers::list_registrations_handler),
        )
        .route_layer(from_fn_with_state(app_state.auth_state(), auth_middleware));

    let public = Router::new()
        .route("/events", get(handlers::list_events_handler))
        .route("/events/:id", get(handlers::get_event_handler))
        .route("/events/search/:term", post(handlers::search_events_handler))
        .route("/signup", post(handlers::signup_handler))
        .route("/login", post(handlers::login_handler))
        .route("/health", get(handlers::health_handler));

    let body_limit = app_state.config.body_size_limit_bytes;
    let timeout_secs = app_state.config.request_timeout_secs;
    let cors = middleware::cors_layer(&app_state.config.cors_allowed_origins);

    // HandleErrorLayer must come BEFORE timeout to catch the timeout error
    let timeout_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|e: BoxError| async move {
            if e.is::<tower::timeout::error::Elapsed>() {
                ApiError::new(StatusCode::REQUEST_TIMEOUT, "request timed out".to_string())
            } else {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        }))
        .timeout(Duration::from_secs(timeout_secs))
        .into_inner();

    // Layers wrap in reverse order: the last one added is the outermost
    public
        .merge(protected)
        .with_state(app_state)
        .layer(middleware::body_size_limit_layer(body_limit))
        .layer(timeout_stack)
        .layer(cors)
        .layer(middleware::tracing_layer())
}
