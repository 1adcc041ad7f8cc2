//! Social graph: follow edges and likes

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiResult, RuleViolation},
    middleware::Identity,
    models::LikeState,
    repositories::{AccountStore, EdgeChange, PostStore, StoreError},
    rules,
};

/// Follow/unfollow and like operations on top of the stores
///
/// The rules are checked against the identity as resolved at the start of
/// the request. The store write itself is conditional, so a concurrent
/// request that got there first turns into the matching rule violation
/// instead of a half-written edge.
#[derive(Clone)]
pub struct SocialGraph {
    accounts: Arc<dyn AccountStore>,
    posts: Arc<dyn PostStore>,
}

impl SocialGraph {
    pub fn new(accounts: Arc<dyn AccountStore>, posts: Arc<dyn PostStore>) -> Self {
        Self { accounts, posts }
    }

    /// Make `identity` follow `target_id`
    pub async fn follow(&self, identity: &Identity, target_id: Uuid) -> ApiResult<()> {
        let target = self.accounts.find_account(target_id).await?;
        rules::can_follow(identity, target_id, target.as_ref())?;

        match self.accounts.add_follow_edge(identity.id, target_id).await {
            Ok(EdgeChange::Applied) => {
                info!("Account {} now follows {}", identity.id, target_id);
                Ok(())
            }
            Ok(EdgeChange::Unchanged) => Err(RuleViolation::AlreadyFollowing.into()),
            Err(StoreError::NotFound) => Err(RuleViolation::TargetNotFound.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Make `identity` stop following `target_id`
    pub async fn unfollow(&self, identity: &Identity, target_id: Uuid) -> ApiResult<()> {
        let target = self.accounts.find_account(target_id).await?;
        rules::can_unfollow(identity, target_id, target.as_ref())?;

        match self.accounts.remove_follow_edge(identity.id, target_id).await {
            Ok(EdgeChange::Applied) => {
                info!("Account {} no longer follows {}", identity.id, target_id);
                Ok(())
            }
            Ok(EdgeChange::Unchanged) => Err(RuleViolation::NotFollowing.into()),
            Err(StoreError::NotFound) => Err(RuleViolation::TargetNotFound.into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Like the post if `identity` has not liked it yet, unlike it otherwise
    pub async fn toggle_like(&self, identity: &Identity, post_id: Uuid) -> ApiResult<LikeState> {
        let post = self.posts.find_post(post_id).await?;
        rules::can_like(post.as_ref())?;

        match self.posts.toggle_like(post_id, identity.id).await {
            Ok(state) => Ok(state),
            Err(StoreError::NotFound) => Err(RuleViolation::PostNotFound.into()),
            Err(e) => Err(e.into()),
        }
    }
}
