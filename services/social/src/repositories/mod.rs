//! Repositories for account and post persistence
//!
//! Handlers and services only see the [`AccountStore`] and [`PostStore`]
//! traits. [`PgStore`] backs them with PostgreSQL, [`MemoryStore`] keeps
//! everything in process for tests and throwaway runs.

use async_trait::async_trait;
use common::error::DatabaseError;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Account, LikeState, NewAccount, NewPost, Post, PostChanges, ProfileChanges};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Account field guarded by a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Username => f.write_str("Username"),
            UniqueField::Email => f.write_str("Email"),
        }
    }
}

/// Errors raised by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique field collided with an existing account
    #[error("{0} already exists")]
    Duplicate(UniqueField),

    /// The addressed record does not exist
    #[error("Record not found")]
    NotFound,

    /// Underlying database failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a conditional follow-graph write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeChange {
    /// Both sides of the edge were written
    Applied,
    /// The edge was already in the requested state; nothing was written
    Unchanged,
}

/// Credential store: account records keyed by id, username and email
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Fails with [`StoreError::Duplicate`] when the
    /// username or email is taken.
    async fn create_account(&self, new_account: NewAccount) -> StoreResult<Account>;

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>>;

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// Apply profile changes and bump `updated_at`
    async fn update_account(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Account>;

    /// Add `target` to `follower`'s followings and `follower` to `target`'s
    /// followers, both or neither.
    ///
    /// Returns [`EdgeChange::Unchanged`] when the edge already exists and
    /// [`StoreError::NotFound`] when either account is missing.
    async fn add_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange>;

    /// Remove both halves of the edge, both or neither.
    async fn remove_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange>;

    /// Delete an account together with its posts, its likes and every
    /// follow edge that references it.
    async fn delete_account(&self, id: Uuid) -> StoreResult<()>;
}

/// Content store: post records keyed by id and owner
#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post>;

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>>;

    /// All posts owned by any of `owners`, in no particular order
    async fn posts_by_owners(&self, owners: &[Uuid]) -> StoreResult<Vec<Post>>;

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Post>;

    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;

    /// Flip `account`'s membership in the post's likes in a single write
    async fn toggle_like(&self, id: Uuid, account: Uuid) -> StoreResult<LikeState>;
}
