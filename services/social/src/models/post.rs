//! Post model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Post entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub desc: Option<String>,
    pub img: Option<String>,
    pub likes: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Public representation with the like count
    pub fn view(&self) -> PostView {
        PostView {
            id: self.id,
            user_id: self.owner_id,
            desc: self.desc.clone(),
            img: self.img.clone(),
            likes: self.likes.iter().copied().collect(),
            likes_count: self.likes.len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// New post creation payload
#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: Uuid,
    pub desc: Option<String>,
    pub img: Option<String>,
}

/// Validated post changes; `None` keeps the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostChanges {
    pub desc: Option<String>,
    pub img: Option<String>,
}

fn blank_to_empty(value: Option<String>) -> Option<String> {
    value.map(|v| if v.trim().is_empty() { String::new() } else { v })
}

impl PostChanges {
    /// Changes from client input. Whitespace-only values become empty
    /// strings, which clear the field.
    pub fn new(desc: Option<String>, img: Option<String>) -> Self {
        Self {
            desc: blank_to_empty(desc),
            img: blank_to_empty(img),
        }
    }

    /// Apply the changes to an in-memory post. Blank strings clear a field.
    pub fn apply(self, post: &mut Post) {
        if let Some(desc) = self.desc {
            post.desc = Some(desc).filter(|d| !d.trim().is_empty());
        }
        if let Some(img) = self.img {
            post.img = Some(img).filter(|i| !i.trim().is_empty());
        }
    }
}

/// Outcome of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeState {
    Liked,
    Unliked,
}

/// Post as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub desc: Option<String>,
    pub img: Option<String>,
    pub likes: Vec<Uuid>,
    pub likes_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for post creation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub desc: Option<String>,
    pub img: Option<String>,
}

/// Request for post update; only `desc` and `img` are settable
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdatePostRequest {
    pub desc: Option<String>,
    pub img: Option<String>,
}
