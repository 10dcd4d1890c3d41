// Axum authentication middleware

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::responses::ApiError;
use crate::auth::audit_logger::{AuditLogger, AuthContext, AuthEvent};
use crate::auth::token::TokenService;
use crate::core::errors::AppError;

/// Authentication state containing all dependencies
#[derive(Clone)]
pub struct AuthState {
    pub token_service: Arc<TokenService>,
    pub audit_logger: Arc<AuditLogger>,
}

/// Authentication middleware function
///
/// Extracts the token from the `Authorization` header, validates it, and puts the
/// resulting `Principal` into request extensions for handlers to use. A rejected
/// request never reaches the wrapped handler.
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract token from header
    let token = match extract_token(request.headers()) {
        Some(token) => token,
        None => {
            auth_state.audit_logger.log_auth_event(
                AuthEvent::TokenRejected { reason: "Missing token".to_string() },
                request_context(request.headers()),
            );
            return Err(ApiError::from(AppError::Authentication("not authorized".to_string())));
        }
    };

    // 2. Validate signature and expiry
    let principal = match auth_state.token_service.validate(&token) {
        Ok(principal) => principal,
        Err(e) => {
            auth_state.audit_logger.log_auth_event(
                AuthEvent::TokenRejected { reason: e.to_string() },
                request_context(request.headers()),
            );
            return Err(ApiError::from(AppError::Token(e)));
        }
    };

    // 3. Log success
    auth_state.audit_logger.log_auth_event(
        AuthEvent::TokenAccepted,
        AuthContext {
            user_id: Some(principal.user_id),
            ..request_context(request.headers())
        },
    );

    // 4. Set principal for handler
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

/// Extract the raw token from the `Authorization` header
///
/// The header carries the bare token; a `Bearer` scheme (any case) is tolerated.
/// A scheme with nothing after it counts as no token.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => rest.trim(),
        None if value.eq_ignore_ascii_case("bearer") => "",
        _ => value,
    };

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Client address and agent for audit records
///
/// Checks `X-Forwarded-For` first (for proxied requests), then `X-Real-IP`.
pub fn request_context(headers: &HeaderMap) -> AuthContext {
    let ip_address = headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    AuthContext {
        ip_address,
        user_agent,
        ..AuthContext::default()
    }
}
