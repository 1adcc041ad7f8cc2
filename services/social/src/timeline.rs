//! Timeline aggregation

use crate::{error::ApiResult, middleware::Identity, models::Post, repositories::PostStore};

/// Posts by `identity` and by every account it follows, newest first
///
/// Recomputed on every call. Posts sharing a timestamp are ordered by id so
/// the result is deterministic.
pub async fn timeline(posts: &dyn PostStore, identity: &Identity) -> ApiResult<Vec<Post>> {
    let mut owners = Vec::with_capacity(identity.followings.len() + 1);
    owners.push(identity.id);
    owners.extend(
        identity
            .followings
            .iter()
            .copied()
            .filter(|id| *id != identity.id),
    );

    let mut feed = posts.posts_by_owners(&owners).await?;
    feed.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    feed.dedup_by_key(|post| post.id);

    Ok(feed)
}
