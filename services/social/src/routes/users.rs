//! Account, profile and follow routes

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use super::{ApiJson, parse_id};
use crate::{
    AppState,
    error::{ApiError, ApiResult, RuleViolation},
    middleware::Identity,
    models::{ProfileChanges, UpdateProfileRequest},
    validation::{validate_image_url, validate_password, validate_username},
};

/// Current account
pub async fn current_user(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "user": identity.view(),
    }))
}

/// Public profile of any account
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, RuleViolation::TargetNotFound.into())?;

    let account = state
        .accounts
        .find_account(id)
        .await?
        .ok_or(RuleViolation::TargetNotFound)?;

    Ok(Json(json!({
        "success": true,
        "user": account.view(),
    })))
}

/// Update the caller's own profile
///
/// Only the keys of [`UpdateProfileRequest`] are accepted. A new password is
/// strength-checked and re-hashed, a new username is checked for collisions.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut changes = ProfileChanges::default();

    if let Some(username) = payload.username {
        validate_username(&username).map_err(ApiError::Validation)?;
        if username != identity.username {
            if state
                .accounts
                .find_account_by_username(&username)
                .await?
                .is_some()
            {
                return Err(ApiError::Conflict("Username already exists".to_string()));
            }
            changes.username = Some(username);
        }
    }

    if let Some(password) = payload.password {
        validate_password(&password).map_err(ApiError::Validation)?;
        changes.password_hash = Some(state.passwords.spawn_hash(password).await?);
    }

    for picture in [&payload.profile_picture, &payload.cover_picture]
        .into_iter()
        .flatten()
    {
        if !picture.is_empty() {
            validate_image_url(picture).map_err(ApiError::Validation)?;
        }
    }

    changes.profile_picture = payload.profile_picture;
    changes.cover_picture = payload.cover_picture;
    changes.desc = payload.desc;
    changes.city = payload.city;
    changes.from = payload.from;
    changes.relationship = payload.relationship;

    let account = if changes.is_empty() {
        identity.account().clone()
    } else {
        let account = state.accounts.update_account(identity.id, changes).await?;
        info!("Account {} updated its profile", account.id);
        account
    };

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": account.view(),
    })))
}

/// Delete the caller's own account with its posts, likes and follow edges
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    state.accounts.delete_account(identity.id).await?;
    info!("Account {} deleted", identity.id);

    Ok(Json(json!({
        "success": true,
        "message": "Account deleted successfully",
    })))
}

/// Follow another account
pub async fn follow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target_id = parse_id(&id, RuleViolation::TargetNotFound.into())?;
    state.graph.follow(&identity, target_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User has been followed",
    })))
}

/// Stop following another account
pub async fn unfollow(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let target_id = parse_id(&id, RuleViolation::TargetNotFound.into())?;
    state.graph.unfollow(&identity, target_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User has been unfollowed",
    })))
}
