//! In-process store
//!
//! Accounts and posts live behind one `RwLock`, so every multi-record write
//! (follow edges, cascading deletes) happens inside a single critical
//! section.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountStore, EdgeChange, PostStore, StoreError, StoreResult, UniqueField,
};
use crate::models::{
    Account, LikeState, NewAccount, NewPost, Post, PostChanges, Profile, ProfileChanges,
};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<Uuid, Account>,
    posts: HashMap<Uuid, Post>,
}

impl Tables {
    fn taken(&self, field: UniqueField, value: &str, except: Option<Uuid>) -> bool {
        self.accounts.values().any(|account| {
            Some(account.id) != except
                && match field {
                    UniqueField::Username => account.username == value,
                    UniqueField::Email => account.email == value,
                }
        })
    }
}

/// Store keeping all records in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create_account(&self, new_account: NewAccount) -> StoreResult<Account> {
        let mut tables = self.tables.write().await;

        if tables.taken(UniqueField::Email, &new_account.email, None) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if tables.taken(UniqueField::Username, &new_account.username, None) {
            return Err(StoreError::Duplicate(UniqueField::Username));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: new_account.username,
            email: new_account.email,
            password_hash: new_account.password_hash,
            profile: Profile::default(),
            followers: BTreeSet::new(),
            followings: BTreeSet::new(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        };
        tables.accounts.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.tables.read().await.accounts.get(&id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        Ok(tables
            .accounts
            .values()
            .find(|account| account.username == username)
            .cloned())
    }

    async fn update_account(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Account> {
        let mut tables = self.tables.write().await;

        if let Some(username) = &changes.username {
            if tables.taken(UniqueField::Username, username, Some(id)) {
                return Err(StoreError::Duplicate(UniqueField::Username));
            }
        }

        let account = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply(account);
        account.updated_at = Utc::now();

        Ok(account.clone())
    }

    async fn add_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange> {
        let mut tables = self.tables.write().await;

        if !tables.accounts.contains_key(&follower) || !tables.accounts.contains_key(&target) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let Some(source) = tables.accounts.get_mut(&follower) else {
            return Err(StoreError::NotFound);
        };
        if !source.followings.insert(target) {
            return Ok(EdgeChange::Unchanged);
        }
        source.updated_at = now;

        if let Some(sink) = tables.accounts.get_mut(&target) {
            sink.followers.insert(follower);
            sink.updated_at = now;
        }

        Ok(EdgeChange::Applied)
    }

    async fn remove_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange> {
        let mut tables = self.tables.write().await;

        if !tables.accounts.contains_key(&follower) || !tables.accounts.contains_key(&target) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let Some(source) = tables.accounts.get_mut(&follower) else {
            return Err(StoreError::NotFound);
        };
        if !source.followings.remove(&target) {
            return Ok(EdgeChange::Unchanged);
        }
        source.updated_at = now;

        if let Some(sink) = tables.accounts.get_mut(&target) {
            sink.followers.remove(&follower);
            sink.updated_at = now;
        }

        Ok(EdgeChange::Applied)
    }

    async fn delete_account(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if tables.accounts.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        for account in tables.accounts.values_mut() {
            account.followers.remove(&id);
            account.followings.remove(&id);
        }
        tables.posts.retain(|_, post| post.owner_id != id);
        for post in tables.posts.values_mut() {
            post.likes.remove(&id);
        }

        Ok(())
    }
}

#[async_trait]
impl PostStore for MemoryStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;

        if !tables.accounts.contains_key(&new_post.owner_id) {
            return Err(StoreError::NotFound);
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            owner_id: new_post.owner_id,
            desc: new_post.desc,
            img: new_post.img,
            likes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };
        tables.posts.insert(post.id, post.clone());

        Ok(post)
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn posts_by_owners(&self, owners: &[Uuid]) -> StoreResult<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .values()
            .filter(|post| owners.contains(&post.owner_id))
            .cloned()
            .collect())
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Post> {
        let mut tables = self.tables.write().await;

        let post = tables.posts.get_mut(&id).ok_or(StoreError::NotFound)?;
        changes.apply(post);
        post.updated_at = Utc::now();

        Ok(post.clone())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    async fn toggle_like(&self, id: Uuid, account: Uuid) -> StoreResult<LikeState> {
        let mut tables = self.tables.write().await;

        let post = tables.posts.get_mut(&id).ok_or(StoreError::NotFound)?;
        if post.likes.remove(&account) {
            Ok(LikeState::Unliked)
        } else {
            post.likes.insert(account);
            Ok(LikeState::Liked)
        }
    }
}
