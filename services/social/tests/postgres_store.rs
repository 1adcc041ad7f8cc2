//! PostgreSQL store tests
//!
//! They need a running server reachable through `DATABASE_URL` and are
//! ignored by default: `cargo test -- --ignored`.

use common::database::{DatabaseConfig, init_pool};
use social::{
    models::{NewAccount, NewPost, PostChanges, ProfileChanges, Relationship},
    repositories::{AccountStore, EdgeChange, PgStore, PostStore, StoreError, UniqueField},
};
use uuid::Uuid;

async fn store() -> PgStore {
    let config = DatabaseConfig::from_env().unwrap();
    let pool = init_pool(&config).await.unwrap();
    let store = PgStore::new(pool);
    store.migrate().await.unwrap();
    store
}

fn new_account(tag: &str) -> NewAccount {
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    NewAccount {
        username: format!("{}{}", tag, suffix),
        email: format!("{}{}@x.com", tag, suffix),
        password_hash: "$argon2id$unused".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_account_uniqueness() {
    let store = store().await;
    let alice = store.create_account(new_account("alice")).await.unwrap();

    let clash = store
        .create_account(NewAccount {
            username: alice.username.clone(),
            ..new_account("other")
        })
        .await;
    assert!(matches!(
        clash,
        Err(StoreError::Duplicate(UniqueField::Username))
    ));

    let clash = store
        .create_account(NewAccount {
            email: alice.email.clone(),
            ..new_account("other")
        })
        .await;
    assert!(matches!(clash, Err(StoreError::Duplicate(UniqueField::Email))));

    let found = store
        .find_account_by_email(&alice.email)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, alice.id);

    store.delete_account(alice.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_profile_update() {
    let store = store().await;
    let alice = store.create_account(new_account("alice")).await.unwrap();

    let updated = store
        .update_account(
            alice.id,
            ProfileChanges {
                city: Some("Douala".to_string()),
                relationship: Some(Relationship::Married),
                ..ProfileChanges::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.profile.city, "Douala");
    assert_eq!(updated.profile.relationship, Some(Relationship::Married));
    assert_eq!(updated.username, alice.username);

    store.delete_account(alice.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_follow_edges_are_symmetric() {
    let store = store().await;
    let alice = store.create_account(new_account("alice")).await.unwrap();
    let bob = store.create_account(new_account("bob")).await.unwrap();

    assert_eq!(
        store.add_follow_edge(alice.id, bob.id).await.unwrap(),
        EdgeChange::Applied
    );
    assert_eq!(
        store.add_follow_edge(alice.id, bob.id).await.unwrap(),
        EdgeChange::Unchanged
    );

    let a = store.find_account(alice.id).await.unwrap().unwrap();
    let b = store.find_account(bob.id).await.unwrap().unwrap();
    assert!(a.followings.contains(&bob.id));
    assert!(b.followers.contains(&alice.id));

    assert_eq!(
        store.remove_follow_edge(alice.id, bob.id).await.unwrap(),
        EdgeChange::Applied
    );
    assert_eq!(
        store.remove_follow_edge(alice.id, bob.id).await.unwrap(),
        EdgeChange::Unchanged
    );
    assert!(matches!(
        store.add_follow_edge(alice.id, Uuid::new_v4()).await,
        Err(StoreError::NotFound)
    ));

    store.delete_account(alice.id).await.unwrap();
    store.delete_account(bob.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_concurrent_follows_apply_once() {
    let store = store().await;
    let alice = store.create_account(new_account("alice")).await.unwrap();
    let bob = store.create_account(new_account("bob")).await.unwrap();

    let (follower, target) = (alice.id, bob.id);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.add_follow_edge(follower, target).await.unwrap()
        }));
    }

    let mut applied = 0;
    for handle in handles {
        if handle.await.unwrap() == EdgeChange::Applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let b = store.find_account(bob.id).await.unwrap().unwrap();
    assert_eq!(b.followers.len(), 1);

    store.delete_account(alice.id).await.unwrap();
    store.delete_account(bob.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_posts_likes_and_cascade() {
    let store = store().await;
    let alice = store.create_account(new_account("alice")).await.unwrap();
    let bob = store.create_account(new_account("bob")).await.unwrap();

    let post = store
        .create_post(NewPost {
            owner_id: alice.id,
            desc: Some("hello".to_string()),
            img: None,
        })
        .await
        .unwrap();

    let updated = store
        .update_post(
            post.id,
            PostChanges {
                desc: None,
                img: Some("https://cdn.example.com/a.png".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.desc.as_deref(), Some("hello"));
    assert!(updated.img.is_some());

    store.toggle_like(post.id, bob.id).await.unwrap();
    store.add_follow_edge(alice.id, bob.id).await.unwrap();

    let feed = store.posts_by_owners(&[alice.id]).await.unwrap();
    assert_eq!(feed.len(), 1);
    assert!(feed[0].likes.contains(&bob.id));

    store.delete_account(bob.id).await.unwrap();
    let a = store.find_account(alice.id).await.unwrap().unwrap();
    assert!(a.followings.is_empty());
    let post_after = store.find_post(post.id).await.unwrap().unwrap();
    assert!(post_after.likes.is_empty());

    store.delete_account(alice.id).await.unwrap();
    assert!(store.find_post(post.id).await.unwrap().is_none());
}
