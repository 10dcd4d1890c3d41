// Domain error types - Secure error handling with no information disclosure

use thiserror::Error;

/// Main error type for the events service
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed request body, path parameter or missing field (HTTP 400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Missing credentials or failed login (HTTP 401)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Bearer token rejected (HTTP 401)
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Authenticated principal is not allowed to act on the resource (HTTP 401)
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Entity does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// (event, user) pair is already registered (HTTP 409)
    #[error("User {user_id} is already registered for event {event_id}")]
    DuplicateRegistration { event_id: i64, user_id: i64 },

    /// Signup with an email that already has an account (HTTP 409)
    #[error("Email already registered")]
    EmailTaken,

    /// Storage failure (HTTP 500)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Credential hashing failure (HTTP 500)
    #[error("Hashing error: {0}")]
    Hashing(#[from] HashingError),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Bearer token errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed payload, or claims that do not fit the scheme
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Signature is fine but the token is past its expiry
    #[error("Token expired")]
    Expired,

    /// Failed to encode a new token
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Password hashing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HashingError {
    /// Could not draw a salt from the OS random source
    #[error("Failed to generate salt: {0}")]
    Randomness(String),

    /// The hashing algorithm itself failed
    #[error("Hashing failed: {0}")]
    Algorithm(String),

    /// Stored hash cannot be decoded
    #[error("Malformed password hash: {0}")]
    MalformedHash(String),
}

impl AppError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::Authentication(_) => 401,
            AppError::Token(TokenError::Signing(_)) => 500,
            AppError::Token(_) => 401,
            AppError::Authorization(_) => 401,
            AppError::NotFound(_) => 404,
            AppError::DuplicateRegistration { .. } => 409,
            AppError::EmailTaken => 409,
            AppError::Persistence(_) => 500,
            AppError::Hashing(_) => 500,
            AppError::Configuration(_) => 500,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(reason) => reason.clone(),
            AppError::Authentication(reason) => reason.clone(),
            AppError::Token(TokenError::Signing(_)) => "could not generate token".to_string(),
            AppError::Token(_) => "not authorized".to_string(),
            AppError::Authorization(reason) => reason.clone(),
            AppError::NotFound(what) => format!("{} not found", what),
            AppError::DuplicateRegistration { .. } => {
                "already registered for this event".to_string()
            }
            AppError::EmailTaken => "email already registered".to_string(),
            AppError::Persistence(_) => "Internal error".to_string(),
            AppError::Hashing(_) => "Internal error".to_string(),
            AppError::Configuration(_) => "Internal error".to_string(),
        }
    }
}
