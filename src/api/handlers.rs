// Request handlers for API endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::api::responses::{
    ApiError, EventResponse, HealthResponse, LoginResponse, MessageResponse, SignupResponse,
};
use crate::api::AppState;
use crate::auth::audit_logger::{AuthContext, AuthEvent};
use crate::auth::auth_middleware::request_context;
use crate::auth::credentials::{parse_credentials, sign_up, validate_credentials};
use crate::core::errors::AppError;
use crate::core::models::{
    CredentialsInput, Event, EventId, EventInput, Principal, Registration, UserView,
};
use crate::engine::ownership::ensure_can_mutate;

/// Request ID from `x-request-id`, or a fresh UUID
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Error mapper that stamps the request ID onto the response
fn reject(request_id: &str) -> impl Fn(AppError) -> ApiError + '_ {
    move |err| {
        if err.status_code() >= 500 {
            error!(error = %err, request_id = %request_id, "Request failed");
        } else {
            debug!(error = %err, request_id = %request_id, "Request rejected");
        }
        ApiError::from_app_error_with_id(err, request_id.to_string())
    }
}

fn parse_event_id(id: Result<Path<EventId>, PathRejection>) -> Result<EventId, AppError> {
    id.map(|Path(id)| id)
        .map_err(|_| AppError::Validation("could not parse event id".to_string()))
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(format!("could not parse request data: {}", e.body_text())))
}

/// GET /events
pub async fn list_events_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Event>>, ApiError> {
    let request_id = request_id(&headers);
    let events = app_state
        .events
        .get_all()
        .await
        .map_err(reject(&request_id))?;

    debug!(count = events.len(), request_id = %request_id, "Listed events");
    Ok(Json(events))
}

/// GET /events/:id
pub async fn get_event_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Json<Event>, ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    let event = app_state
        .events
        .get_by_id(id)
        .await
        .map_err(reject(&request_id))?;

    Ok(Json(event))
}

/// POST /events
///
/// The owner is always the authenticated principal; any owner field in the
/// body is ignored.
pub async fn create_event_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let request_id = request_id(&headers);
    let changes = parse_body(payload)
        .and_then(EventInput::validate)
        .map_err(reject(&request_id))?;

    let event = app_state
        .events
        .create(changes.owned_by(principal.user_id))
        .await
        .map_err(reject(&request_id))?;

    info!(
        event_id = event.id,
        user_id = principal.user_id,
        request_id = %request_id,
        "Event created"
    );

    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Event created".to_string(),
            event,
        }),
    ))
}

/// PUT /events/:id
///
/// Flow: parse id, load the event (404), check ownership (401), then parse
/// and apply the new fields. Owner and id are never changed.
pub async fn update_event_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    id: Result<Path<EventId>, PathRejection>,
    payload: Result<Json<EventInput>, JsonRejection>,
) -> Result<Json<EventResponse>, ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    let existing = app_state
        .events
        .get_by_id(id)
        .await
        .map_err(reject(&request_id))?;
    ensure_can_mutate(&principal, &existing, "update").map_err(reject(&request_id))?;

    let changes = parse_body(payload)
        .and_then(EventInput::validate)
        .map_err(reject(&request_id))?;

    let event = app_state
        .events
        .update(id, changes)
        .await
        .map_err(reject(&request_id))?;

    info!(
        event_id = event.id,
        user_id = principal.user_id,
        request_id = %request_id,
        "Event updated"
    );

    Ok(Json(EventResponse {
        message: "event updated successfully".to_string(),
        event,
    }))
}

/// DELETE /events/:id
///
/// Removes the event together with its registrations.
pub async fn delete_event_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    let existing = app_state
        .events
        .get_by_id(id)
        .await
        .map_err(reject(&request_id))?;
    ensure_can_mutate(&principal, &existing, "delete").map_err(reject(&request_id))?;

    let removed = app_state
        .events
        .delete(id)
        .await
        .map_err(reject(&request_id))?;

    if removed {
        info!(event_id = id, user_id = principal.user_id, request_id = %request_id, "Event deleted");
    } else {
        // Deleted concurrently between the lookup and the delete
        warn!(event_id = id, request_id = %request_id, "Event already gone at delete time");
    }

    Ok(Json(MessageResponse::new("event deleted successfully")))
}

/// POST /events/:id/register
pub async fn register_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    app_state
        .events
        .get_by_id(id)
        .await
        .map_err(reject(&request_id))?;

    app_state
        .registrations
        .register(id, principal.user_id)
        .await
        .map_err(reject(&request_id))?;

    info!(event_id = id, user_id = principal.user_id, request_id = %request_id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("registered successfully")),
    ))
}

/// DELETE /events/:id/register
///
/// Idempotent: cancelling a registration that does not exist still succeeds.
pub async fn cancel_registration_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    let removed = app_state
        .registrations
        .unregister(id, principal.user_id)
        .await
        .map_err(reject(&request_id))?;

    if removed {
        info!(event_id = id, user_id = principal.user_id, request_id = %request_id, "Registration cancelled");
    } else {
        debug!(event_id = id, user_id = principal.user_id, "No registration to cancel");
    }

    Ok(Json(MessageResponse::new("unregistered successfully")))
}

/// GET /events/:id/registrations
///
/// Only the event owner may see who registered.
pub async fn list_registrations_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(principal): Extension<Principal>,
    id: Result<Path<EventId>, PathRejection>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let request_id = request_id(&headers);
    let id = parse_event_id(id).map_err(reject(&request_id))?;

    let event = app_state
        .events
        .get_by_id(id)
        .await
        .map_err(reject(&request_id))?;
    ensure_can_mutate(&principal, &event, "view registrations of")
        .map_err(reject(&request_id))?;

    let registrations = app_state
        .registrations
        .registrations_for_event(id)
        .await
        .map_err(reject(&request_id))?;

    Ok(Json(registrations))
}

/// POST /events/search/:term
///
/// Case-insensitive substring match over name, description and location.
pub async fn search_events_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    term: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<Event>>, ApiError> {
    let request_id = request_id(&headers);
    let term = term
        .map(|Path(term)| term)
        .map_err(|_| AppError::Validation("could not parse search term".to_string()))
        .map_err(reject(&request_id))?;

    let events = app_state
        .events
        .search(&term)
        .await
        .map_err(reject(&request_id))?;

    debug!(term = %term, count = events.len(), request_id = %request_id, "Searched events");
    Ok(Json(events))
}

/// POST /signup
pub async fn signup_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsInput>, JsonRejection>,
) -> Result<(StatusCode, Json<SignupResponse>), ApiError> {
    let request_id = request_id(&headers);
    let (email, password) = parse_body(payload)
        .and_then(parse_credentials)
        .map_err(reject(&request_id))?;

    let user = sign_up(
        app_state.users.as_ref(),
        &app_state.password_hasher,
        &email,
        password,
    )
    .await
    .map_err(reject(&request_id))?;

    app_state.audit_logger.log_auth_event(
        AuthEvent::SignupSuccess,
        AuthContext {
            user_id: Some(user.id),
            email: Some(user.email.clone()),
            ..request_context(&headers)
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "user created successfully".to_string(),
            user: UserView::from(&user),
        }),
    ))
}

/// POST /login
///
/// Returns a signed token on success. Unknown email and wrong password give
/// the same 401.
pub async fn login_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CredentialsInput>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let request_id = request_id(&headers);
    let (email, password) = parse_body(payload)
        .and_then(parse_credentials)
        .map_err(reject(&request_id))?;

    let user = match validate_credentials(
        app_state.users.as_ref(),
        &app_state.password_hasher,
        &email,
        password,
    )
    .await
    {
        Ok(user) => user,
        Err(e) => {
            app_state.audit_logger.log_auth_event(
                AuthEvent::LoginFailure { reason: e.to_string() },
                AuthContext {
                    email: Some(email.clone()),
                    ..request_context(&headers)
                },
            );
            return Err(reject(&request_id)(e));
        }
    };

    let token = app_state
        .token_service
        .issue(user.id, &user.email)
        .map_err(|e| reject(&request_id)(AppError::Token(e)))?;

    app_state.audit_logger.log_auth_event(
        AuthEvent::LoginSuccess,
        AuthContext {
            user_id: Some(user.id),
            email: Some(user.email.clone()),
            ..request_context(&headers)
        },
    );

    Ok(Json(LoginResponse {
        message: "login successful".to_string(),
        token,
    }))
}

/// Health check handler
///
/// GET /health
///
/// Always 200 while the server is up; the store status is reported in the body.
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let database = match tokio::time::timeout(Duration::from_millis(500), app_state.events.ping())
        .await
    {
        Ok(Ok(())) => "connected".to_string(),
        Ok(Err(e)) => {
            warn!(error = %e, "Store ping failed");
            format!("unavailable: {}", e)
        }
        Err(_) => {
            debug!("Store ping timed out in health check");
            "unavailable: timeout".to_string()
        }
    };

    let status = if database == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        database,
    })
}
