//! JWT service for session token issuance and validation
//!
//! Tokens are HS256 JWTs signed with a process-wide secret. A token binds an
//! account id (`sub`) to an absolute expiry (`exp`); nothing is stored
//! server side, so validity is the signature plus the clock.

use anyhow::Result;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult, AuthError};

/// Default session lifetime: 7 days
pub const DEFAULT_TOKEN_EXPIRY: u64 = 7 * 24 * 60 * 60;

/// Longest accepted session lifetime: 365 days
pub const MAX_TOKEN_EXPIRY: u64 = 365 * 24 * 60 * 60;

/// JWT configuration
#[derive(Debug)]
pub struct JwtConfig {
    /// Signing secret, redacted in `Debug` output
    pub secret: SecretString,
    /// Token lifetime in seconds (default: 7 days)
    pub token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC signing secret (required)
    /// - `JWT_EXPIRY`: Token lifetime in seconds (default: 604800, at most 365 days)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;

        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_expiry = match std::env::var("JWT_EXPIRY") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRY must be a number of seconds"))?,
            Err(_) => DEFAULT_TOKEN_EXPIRY,
        };

        if !(1..=MAX_TOKEN_EXPIRY).contains(&token_expiry) {
            anyhow::bail!(
                "JWT_EXPIRY must be between 1 and {} seconds",
                MAX_TOKEN_EXPIRY
            );
        }

        Ok(JwtConfig {
            secret: SecretString::from(secret),
            token_expiry,
        })
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

fn now_secs() -> ApiResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| ApiError::Internal(format!("Failed to get current time: {}", e)))
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        JwtService {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_expiry: config.token_expiry,
        }
    }

    /// Issue a session token for an account
    pub fn issue(&self, account_id: Uuid) -> ApiResult<String> {
        let now = now_secs()?;
        self.sign(&Claims {
            sub: account_id,
            iat: now,
            exp: now.saturating_add(self.token_expiry),
        })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e| {
            error!("Failed to sign token: {}", e);
            ApiError::Internal("Failed to sign token".to_string())
        })
    }

    /// Verify a token and return the account it was issued for
    ///
    /// Fails when the signature does not match, the payload is malformed or
    /// the expiry is in the past.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Rejected session token: {}", e);
            AuthError::InvalidToken
        })?;

        Ok(data.claims.sub)
    }

    /// Token lifetime in seconds
    pub fn token_expiry(&self) -> u64 {
        self.token_expiry
    }
}
