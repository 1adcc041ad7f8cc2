//! Post, like and timeline routes

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Value, json};
use tracing::info;

use super::{ApiJson, parse_id};
use crate::{
    AppState,
    error::{ApiError, ApiResult, RuleViolation},
    middleware::Identity,
    models::{CreatePostRequest, LikeState, NewPost, PostChanges, UpdatePostRequest},
    rules,
    timeline::timeline,
    validation::validate_image_url,
};

const EMPTY_POST: &str = "Post content cannot be empty. Please add text or an image.";

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create a post owned by the caller
pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    ApiJson(payload): ApiJson<CreatePostRequest>,
) -> ApiResult<impl IntoResponse> {
    let desc = non_empty(payload.desc);
    let img = non_empty(payload.img);

    if desc.is_none() && img.is_none() {
        return Err(ApiError::Validation(EMPTY_POST.to_string()));
    }
    if let Some(img) = &img {
        validate_image_url(img).map_err(ApiError::Validation)?;
    }

    let post = state
        .posts
        .create_post(NewPost {
            owner_id: identity.id,
            desc,
            img,
        })
        .await?;

    info!("Account {} created post {}", identity.id, post.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Post created successfully",
            "data": post.view(),
        })),
    ))
}

/// Fetch a single post
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, RuleViolation::PostNotFound.into())?;

    let post = state
        .posts
        .find_post(id)
        .await?
        .ok_or(RuleViolation::PostNotFound)?;

    Ok(Json(json!({
        "success": true,
        "message": "Post fetched successfully",
        "post": post.view(),
    })))
}

/// Update one of the caller's posts
///
/// The body is only decoded once the post is known to exist and to belong
/// to the caller, so a stranger learns nothing from the payload rules. A
/// post may not end up with neither text nor image.
pub async fn update_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, RuleViolation::PostNotFound.into())?;
    let stored = state.posts.find_post(id).await?;
    let post = rules::authorize_post_change(&identity, stored.as_ref())?;

    let payload: UpdatePostRequest =
        serde_json::from_value(body).map_err(|e| ApiError::Validation(e.to_string()))?;

    let changes = PostChanges::new(payload.desc, payload.img);

    if let Some(img) = changes.img.as_deref().filter(|img| !img.is_empty()) {
        validate_image_url(img).map_err(ApiError::Validation)?;
    }

    let mut preview = post.clone();
    changes.clone().apply(&mut preview);
    if preview.desc.is_none() && preview.img.is_none() {
        return Err(ApiError::Validation(EMPTY_POST.to_string()));
    }

    let updated = state.posts.update_post(id, changes).await?;
    info!("Account {} updated post {}", identity.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Post updated successfully",
        "post": updated.view(),
    })))
}

/// Delete one of the caller's posts
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, RuleViolation::PostNotFound.into())?;
    let stored = state.posts.find_post(id).await?;
    rules::authorize_post_change(&identity, stored.as_ref())?;

    state.posts.delete_post(id).await?;
    info!("Account {} deleted post {}", identity.id, id);

    Ok(Json(json!({
        "success": true,
        "message": "Post deleted successfully",
    })))
}

/// Like or unlike a post
pub async fn like_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id, RuleViolation::PostNotFound.into())?;
    let like = state.graph.toggle_like(&identity, id).await?;

    let message = match like {
        LikeState::Liked => "Post liked successfully",
        LikeState::Unliked => "Post unliked successfully",
    };

    Ok(Json(json!({
        "success": true,
        "message": message,
        "state": like,
    })))
}

/// Caller's posts plus posts of followed accounts, newest first
pub async fn timeline_feed(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<impl IntoResponse> {
    let feed = timeline(state.posts.as_ref(), &identity).await?;
    let posts: Vec<_> = feed.iter().map(|post| post.view()).collect();

    Ok(Json(json!({
        "success": true,
        "message": "Timeline fetched successfully",
        "count": posts.len(),
        "posts": posts,
    })))
}
