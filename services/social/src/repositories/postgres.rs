//! PostgreSQL store
//!
//! Follow edges and cascading deletes touch several rows; each of those
//! operations runs in its own transaction so the graph never ends up with
//! one half of an edge.

use async_trait::async_trait;
use common::error::{DatabaseError, unique_violation};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AccountStore, EdgeChange, PostStore, StoreError, StoreResult, UniqueField};
use crate::models::{
    Account, LikeState, NewAccount, NewPost, Post, PostChanges, Profile, ProfileChanges,
};

/// Migrations embedded at compile time
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn query_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(DatabaseError::Query(err))
}

fn transaction_error(err: sqlx::Error) -> StoreError {
    StoreError::Database(DatabaseError::Transaction(err))
}

/// Map unique violations on the accounts table to [`StoreError::Duplicate`]
fn write_error(err: sqlx::Error) -> StoreError {
    let field = match unique_violation(&err) {
        Some("accounts_email_key") => Some(UniqueField::Email),
        Some("accounts_username_key") => Some(UniqueField::Username),
        _ => None,
    };

    match field {
        Some(field) => StoreError::Duplicate(field),
        None => query_error(err),
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    let followers: Vec<Uuid> = row.try_get("followers")?;
    let followings: Vec<Uuid> = row.try_get("followings")?;
    let relationship: Option<String> = row.try_get("relationship")?;

    Ok(Account {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        profile: Profile {
            profile_picture: row.try_get("profile_picture")?,
            cover_picture: row.try_get("cover_picture")?,
            desc: row.try_get("description")?,
            city: row.try_get("city")?,
            from: row.try_get("hometown")?,
            relationship: relationship.and_then(|value| value.parse().ok()),
        },
        followers: followers.into_iter().collect::<BTreeSet<_>>(),
        followings: followings.into_iter().collect::<BTreeSet<_>>(),
        is_admin: row.try_get("is_admin")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    let likes: Vec<Uuid> = row.try_get("likes")?;

    Ok(Post {
        id: row.try_get("id")?,
        owner_id: row.try_get("owner_id")?,
        desc: row.try_get("description")?,
        img: row.try_get("image")?,
        likes: likes.into_iter().collect(),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        info!("Running database migrations");
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))
    }

    async fn find_account_where(
        &self,
        column: &'static str,
        value: &str,
    ) -> StoreResult<Option<Account>> {
        let sql = format!(
            r#"
            SELECT id, username, email, password_hash, profile_picture, cover_picture,
                   description, city, hometown, relationship, followers, followings,
                   is_admin, created_at, updated_at
            FROM accounts
            WHERE {} = $1
            "#,
            column
        );

        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(query_error)
    }
}

#[async_trait]
impl AccountStore for PgStore {
    async fn create_account(&self, new_account: NewAccount) -> StoreResult<Account> {
        info!("Creating new account: {}", new_account.username);

        let row = sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, password_hash, profile_picture, cover_picture,
                      description, city, hometown, relationship, followers, followings,
                      is_admin, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new_account.username)
        .bind(&new_account.email)
        .bind(&new_account.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)?;

        account_from_row(&row).map_err(query_error)
    }

    async fn find_account(&self, id: Uuid) -> StoreResult<Option<Account>> {
        debug!("Finding account by ID: {}", id);

        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, profile_picture, cover_picture,
                   description, city, hometown, relationship, followers, followings,
                   is_admin, created_at, updated_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref()
            .map(account_from_row)
            .transpose()
            .map_err(query_error)
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.find_account_where("email", email).await
    }

    async fn find_account_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.find_account_where("username", username).await
    }

    async fn update_account(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<Account> {
        let row = sqlx::query(
            r#"
            UPDATE accounts
            SET username = COALESCE($2, username),
                password_hash = COALESCE($3, password_hash),
                profile_picture = COALESCE($4, profile_picture),
                cover_picture = COALESCE($5, cover_picture),
                description = COALESCE($6, description),
                city = COALESCE($7, city),
                hometown = COALESCE($8, hometown),
                relationship = COALESCE($9, relationship),
                updated_at = now()
            WHERE id = $1
            RETURNING id, username, email, password_hash, profile_picture, cover_picture,
                      description, city, hometown, relationship, followers, followings,
                      is_admin, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.username)
        .bind(changes.password_hash)
        .bind(changes.profile_picture)
        .bind(changes.cover_picture)
        .bind(changes.desc)
        .bind(changes.city)
        .bind(changes.from)
        .bind(changes.relationship.map(|status| status.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or(StoreError::NotFound)?;

        account_from_row(&row).map_err(query_error)
    }

    async fn add_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange> {
        let mut tx = self.pool.begin().await.map_err(transaction_error)?;

        // Lock both rows in id order so concurrent edge writes cannot deadlock.
        let locked = sqlx::query("SELECT id FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(vec![follower, target])
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;
        if locked.len() != 2 {
            return Err(StoreError::NotFound);
        }

        let outgoing = sqlx::query(
            r#"
            UPDATE accounts
            SET followings = array_append(followings, $2), updated_at = now()
            WHERE id = $1 AND NOT ($2 = ANY (followings))
            "#,
        )
        .bind(follower)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if outgoing.rows_affected() == 0 {
            return Ok(EdgeChange::Unchanged);
        }

        sqlx::query(
            r#"
            UPDATE accounts
            SET followers = array_append(followers, $1), updated_at = now()
            WHERE id = $2 AND NOT ($1 = ANY (followers))
            "#,
        )
        .bind(follower)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(transaction_error)?;
        Ok(EdgeChange::Applied)
    }

    async fn remove_follow_edge(&self, follower: Uuid, target: Uuid) -> StoreResult<EdgeChange> {
        let mut tx = self.pool.begin().await.map_err(transaction_error)?;

        let locked = sqlx::query("SELECT id FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE")
            .bind(vec![follower, target])
            .fetch_all(&mut *tx)
            .await
            .map_err(query_error)?;
        if locked.len() != 2 {
            return Err(StoreError::NotFound);
        }

        let outgoing = sqlx::query(
            r#"
            UPDATE accounts
            SET followings = array_remove(followings, $2), updated_at = now()
            WHERE id = $1 AND $2 = ANY (followings)
            "#,
        )
        .bind(follower)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        if outgoing.rows_affected() == 0 {
            return Ok(EdgeChange::Unchanged);
        }

        sqlx::query(
            r#"
            UPDATE accounts
            SET followers = array_remove(followers, $1), updated_at = now()
            WHERE id = $2
            "#,
        )
        .bind(follower)
        .bind(target)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        tx.commit().await.map_err(transaction_error)?;
        Ok(EdgeChange::Applied)
    }

    async fn delete_account(&self, id: Uuid) -> StoreResult<()> {
        info!("Deleting account: {}", id);

        let mut tx = self.pool.begin().await.map_err(transaction_error)?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET followers = array_remove(followers, $1),
                followings = array_remove(followings, $1),
                updated_at = now()
            WHERE $1 = ANY (followers) OR $1 = ANY (followings)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(query_error)?;

        sqlx::query("UPDATE posts SET likes = array_remove(likes, $1) WHERE $1 = ANY (likes)")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        // Owned posts go with the account through ON DELETE CASCADE.
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(query_error)?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        tx.commit().await.map_err(transaction_error)?;
        Ok(())
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn create_post(&self, new_post: NewPost) -> StoreResult<Post> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (id, owner_id, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, description, image, likes, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_post.owner_id)
        .bind(new_post.desc)
        .bind(new_post.img)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if matches!(&e, sqlx::Error::Database(db) if db.is_foreign_key_violation()) {
                StoreError::NotFound
            } else {
                query_error(e)
            }
        })?;

        post_from_row(&row).map_err(query_error)
    }

    async fn find_post(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_id, description, image, likes, created_at, updated_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        row.as_ref()
            .map(post_from_row)
            .transpose()
            .map_err(query_error)
    }

    async fn posts_by_owners(&self, owners: &[Uuid]) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(
            r#"
            SELECT id, owner_id, description, image, likes, created_at, updated_at
            FROM posts
            WHERE owner_id = ANY ($1)
            "#,
        )
        .bind(owners.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        rows.iter()
            .map(post_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_error)
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> StoreResult<Post> {
        // A blank string clears the column, NULL keeps it.
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET description = CASE
                    WHEN $2::TEXT IS NULL THEN description
                    WHEN btrim($2) = '' THEN NULL
                    ELSE $2
                END,
                image = CASE
                    WHEN $3::TEXT IS NULL THEN image
                    WHEN btrim($3) = '' THEN NULL
                    ELSE $3
                END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, owner_id, description, image, likes, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.desc)
        .bind(changes.img)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or(StoreError::NotFound)?;

        post_from_row(&row).map_err(query_error)
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        if deleted.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn toggle_like(&self, id: Uuid, account: Uuid) -> StoreResult<LikeState> {
        let row = sqlx::query(
            r#"
            UPDATE posts
            SET likes = CASE
                    WHEN $2 = ANY (likes) THEN array_remove(likes, $2)
                    ELSE array_append(likes, $2)
                END
            WHERE id = $1
            RETURNING $2 = ANY (likes) AS liked
            "#,
        )
        .bind(id)
        .bind(account)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or(StoreError::NotFound)?;

        let liked: bool = row.try_get("liked").map_err(query_error)?;
        Ok(if liked {
            LikeState::Liked
        } else {
            LikeState::Unliked
        })
    }
}
