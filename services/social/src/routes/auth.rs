//! Registration and login

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use tracing::{info, warn};

use super::ApiJson;
use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::session_cookie,
    models::{LoginRequest, NewAccount, RegisterRequest},
    validation::{validate_email, validate_password, validate_username},
};

const UNIFORM_LOGIN_ERROR: &str = "Invalid email or password";

/// Attach a fresh session cookie for `account_id` to the jar
fn start_session(
    state: &AppState,
    jar: CookieJar,
    account_id: uuid::Uuid,
) -> ApiResult<CookieJar> {
    let token = state.jwt_service.issue(account_id)?;
    Ok(jar.add(session_cookie(
        token,
        state.jwt_service.token_expiry(),
        state.config.is_production(),
    )))
}

/// Account registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let RegisterRequest {
        username,
        email,
        password,
    } = payload;

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "Username, email, and password are required".to_string(),
        ));
    }

    let email = email.trim().to_lowercase();
    validate_username(&username).map_err(ApiError::Validation)?;
    validate_email(&email).map_err(ApiError::Validation)?;
    validate_password(&password).map_err(ApiError::Validation)?;

    if state.accounts.find_account_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }
    if state
        .accounts
        .find_account_by_username(&username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }

    let password_hash = state.passwords.spawn_hash(password).await?;

    // The store's unique constraint settles races between the checks above
    // and this insert.
    let account = state
        .accounts
        .create_account(NewAccount {
            username,
            email,
            password_hash,
        })
        .await?;

    info!("Registered account {}", account.id);

    let jar = start_session(&state, jar, account.id)?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "user": account.view(),
        })),
    ))
}

/// Login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    validate_email(&email).map_err(ApiError::Validation)?;

    if !state.rate_limiter.try_acquire(&email).await {
        return Err(ApiError::RateLimited);
    }

    let uniform = state.config.uniform_login_errors;

    let Some(account) = state.accounts.find_account_by_email(&email).await? else {
        info!("Login attempt for unknown email");
        return Err(if uniform {
            ApiError::Unauthenticated(UNIFORM_LOGIN_ERROR.to_string())
        } else {
            ApiError::NotFound("User not found".to_string())
        });
    };

    let matches = state
        .passwords
        .spawn_verify(payload.password, account.password_hash.clone())
        .await?;
    if !matches {
        warn!("Failed login for account {}", account.id);
        return Err(ApiError::Unauthenticated(
            if uniform {
                UNIFORM_LOGIN_ERROR
            } else {
                "Incorrect password"
            }
            .to_string(),
        ));
    }

    state.rate_limiter.reset(&email).await;
    info!("Account {} logged in", account.id);

    let jar = start_session(&state, jar, account.id)?;

    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": account.view(),
        })),
    ))
}
