//! Error types for the social service
//!
//! Domain errors ([`AuthError`], [`RuleViolation`], [`StoreError`]) convert
//! into [`ApiError`], which owns the mapping to a stable [`ErrorKind`] and an
//! HTTP status.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::repositories::StoreError;

/// Stable error discriminator returned to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Authentication,
    Authorization,
    RateLimited,
    Internal,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
            ErrorKind::Authorization => StatusCode::FORBIDDEN,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Session resolution failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No `token` cookie on the request
    #[error("Access denied, no token provided")]
    MissingToken,

    /// Bad signature, malformed payload or expired token
    #[error("Invalid token")]
    InvalidToken,

    /// The token is valid but its subject no longer exists
    #[error("User does not exist")]
    UnknownAccount,
}

/// Outcomes of the authorization rules
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleViolation {
    #[error("You can't follow or unfollow yourself")]
    SelfFollow,

    #[error("You already follow this user")]
    AlreadyFollowing,

    #[error("You don't follow this user")]
    NotFollowing,

    #[error("User not found")]
    TargetNotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("Access denied. You can only modify your own posts.")]
    NotPostOwner,
}

impl RuleViolation {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuleViolation::SelfFollow | RuleViolation::NotPostOwner => ErrorKind::Authorization,
            RuleViolation::AlreadyFollowing | RuleViolation::NotFollowing => ErrorKind::Conflict,
            RuleViolation::TargetNotFound | RuleViolation::PostNotFound => ErrorKind::NotFound,
        }
    }
}

/// Custom error type for the social service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed, missing or disallowed input
    #[error("{0}")]
    Validation(String),

    /// Uniqueness collision
    #[error("{0}")]
    Conflict(String),

    /// Missing resource
    #[error("{0}")]
    NotFound(String),

    /// Credentials rejected at login
    #[error("{0}")]
    Unauthenticated(String),

    /// Too many login attempts
    #[error("Too many login attempts, try again later")]
    RateLimited,

    /// Session resolution failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authorization rule rejected the operation
    #[error(transparent)]
    Rule(#[from] RuleViolation),

    /// Store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Any other failure; the message is logged, never returned
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Validation(_) => ErrorKind::Validation,
            ApiError::Conflict(_) => ErrorKind::Conflict,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::Unauthenticated(_) | ApiError::Auth(_) => ErrorKind::Authentication,
            ApiError::RateLimited => ErrorKind::RateLimited,
            ApiError::Rule(violation) => violation.kind(),
            ApiError::Store(StoreError::Duplicate(_)) => ErrorKind::Conflict,
            ApiError::Store(StoreError::NotFound) => ErrorKind::NotFound,
            ApiError::Store(StoreError::Database(_)) | ApiError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "kind": kind,
            "message": self.public_message(),
        }));

        (kind.status(), body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::UniqueField;
    use common::error::DatabaseError;

    #[test]
    fn test_auth_errors_are_authentication_failures() {
        for err in [
            AuthError::MissingToken,
            AuthError::InvalidToken,
            AuthError::UnknownAccount,
        ] {
            let api: ApiError = err.into();
            assert_eq!(api.kind(), ErrorKind::Authentication);
            assert_eq!(api.kind().status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(
            ApiError::from(AuthError::MissingToken).public_message(),
            "Access denied, no token provided"
        );
    }

    #[test]
    fn test_rule_violation_kinds() {
        assert_eq!(
            ApiError::from(RuleViolation::SelfFollow).kind(),
            ErrorKind::Authorization
        );
        assert_eq!(
            ApiError::from(RuleViolation::AlreadyFollowing).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            ApiError::from(RuleViolation::TargetNotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ApiError::from(RuleViolation::NotPostOwner).kind().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_store_errors() {
        let duplicate = ApiError::from(StoreError::Duplicate(UniqueField::Email));
        assert_eq!(duplicate.kind(), ErrorKind::Conflict);
        assert_eq!(duplicate.public_message(), "Email already exists");

        let db = ApiError::from(StoreError::Database(DatabaseError::Configuration(
            "password=hunter2".to_string(),
        )));
        assert_eq!(db.kind(), ErrorKind::Internal);
        assert_eq!(db.public_message(), "Internal server error");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Internal("argon2 exploded".to_string());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.kind().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
