// Response types for API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::core::errors::AppError;
use crate::core::models::{Event, UserView};

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Create/update response carrying the stored event
#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: String,
    pub event: Event,
}

/// Signup response (the password hash is never included)
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: UserView,
}

/// Login response carrying the bearer token
#[derive(Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// API error type that converts domain errors to HTTP responses
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub request_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: String) -> Self {
        Self {
            status,
            message,
            request_id: None,
        }
    }

    /// Create from AppError
    pub fn from_app_error(err: AppError) -> Self {
        let status =
            StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.user_message(),
            request_id: None,
        }
    }

    /// Create from AppError with request ID
    pub fn from_app_error_with_id(err: AppError, request_id: String) -> Self {
        Self {
            request_id: Some(request_id),
            ..Self::from_app_error(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            message: self.message,
            request_id: self.request_id,
        });
        (self.status, body).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError::from_app_error(err)
    }
}
