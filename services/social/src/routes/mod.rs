//! HTTP routes

use axum::{
    Json, Router, async_trait,
    extract::{FromRequest, Request},
    middleware,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::auth_middleware,
};

pub mod auth;
pub mod posts;
pub mod users;

/// Create the router for the social service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/users/get", get(users::current_user))
        .route("/users/profile/:id", get(users::get_profile))
        .route("/users/update", put(users::update_profile))
        .route("/users/delete", delete(users::delete_account))
        .route("/users/follow/:id", put(users::follow))
        .route("/users/unfollow/:id", put(users::unfollow))
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/:id",
            get(posts::get_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:id/like", put(posts::like_post))
        .route("/timeline/feed", get(posts::timeline_feed))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "social-service"
    }))
}

/// JSON body extractor whose rejections use the service's error format
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

/// Parse a path segment as a record id
///
/// A malformed id cannot name an existing record, so it is reported the
/// same way as a missing one.
pub(crate) fn parse_id(raw: &str, not_found: ApiError) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| not_found)
}
