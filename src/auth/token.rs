// Bearer token issuing and validation (HS256 JWT)

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::errors::TokenError;
use crate::core::models::{Principal, UserId};

/// Default token lifetime
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 2 * 60 * 60;

/// JWT payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id as a decimal string
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
}

/// Stateless token service
///
/// Tokens are never persisted: validity is the signature plus the expiry.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service signing with a shared secret
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Build from the loaded configuration (secret and TTL)
    ///
    /// A TTL beyond what `Duration` can hold saturates; issuing then fails
    /// with `TokenError::Signing` instead of wrapping or panicking.
    pub fn from_config(config: &Config) -> Self {
        let ttl = i64::try_from(config.token_ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self::new(config.jwt_secret.expose_secret().as_bytes(), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for a user, valid for the configured TTL from now
    pub fn issue(&self, user_id: UserId, email: &str) -> Result<String, TokenError> {
        self.issue_at(user_id, email, Utc::now())
    }

    /// Issue a token as if it had been issued at `issued_at`
    pub fn issue_at(
        &self,
        user_id: UserId,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry out of range".to_string()))?;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Validate signature and expiry, returning the principal the token was issued to
    pub fn validate(&self, token: &str) -> Result<Principal, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                other => TokenError::Invalid(format!("{:?}", other)),
            }
        })?;

        let user_id = data
            .claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Invalid("subject is not a user id".to_string()))?;

        if data.claims.email.is_empty() {
            return Err(TokenError::Invalid("missing email claim".to_string()));
        }

        Ok(Principal {
            user_id,
            email: data.claims.email,
        })
    }
}
