// Signup and login credential handling

use tracing::debug;

use crate::auth::password::{Password, PasswordHasher};
use crate::core::errors::AppError;
use crate::core::models::{CredentialsInput, User};
use crate::store::UserStore;

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Normalize and check a signup/login body
pub fn parse_credentials(input: CredentialsInput) -> Result<(String, Password), AppError> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if input.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    Ok((email, Password::new(input.password)))
}

/// Hash the password and create the account
pub async fn sign_up(
    users: &dyn UserStore,
    hasher: &PasswordHasher,
    email: &str,
    password: Password,
) -> Result<User, AppError> {
    let hash = hasher.hash_blocking(password).await?;
    users.create(email, hash).await
}

/// Look up the user by email and verify the password
///
/// Unknown email and wrong password produce the same error.
pub async fn validate_credentials(
    users: &dyn UserStore,
    hasher: &PasswordHasher,
    email: &str,
    password: Password,
) -> Result<User, AppError> {
    let user = match users.find_by_email(email).await? {
        Some(user) => user,
        None => {
            debug!("Login for unknown email");
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }
    };

    if hasher
        .verify_blocking(password, user.password_hash.clone())
        .await?
    {
        Ok(user)
    } else {
        debug!(user_id = user.id, "Login with wrong password");
        Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()))
    }
}
