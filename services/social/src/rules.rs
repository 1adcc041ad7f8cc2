//! Authorization rules gating every mutation
//!
//! Plain functions over the resolved [`Identity`] and records the caller has
//! already loaded. Existence is passed in as `Option<&T>`, so nothing here
//! touches storage.

use uuid::Uuid;

use crate::{
    error::RuleViolation,
    middleware::Identity,
    models::{Account, Post},
};

/// Whether `identity` owns `post`
pub fn can_modify_post(identity: &Identity, post: &Post) -> bool {
    post.owner_id == identity.id
}

pub fn can_follow(
    identity: &Identity,
    target_id: Uuid,
    target: Option<&Account>,
) -> Result<(), RuleViolation> {
    if target_id == identity.id {
        return Err(RuleViolation::SelfFollow);
    }
    if target.is_none() {
        return Err(RuleViolation::TargetNotFound);
    }
    if identity.follows(target_id) {
        return Err(RuleViolation::AlreadyFollowing);
    }
    Ok(())
}

pub fn can_unfollow(
    identity: &Identity,
    target_id: Uuid,
    target: Option<&Account>,
) -> Result<(), RuleViolation> {
    if target_id == identity.id {
        return Err(RuleViolation::SelfFollow);
    }
    if target.is_none() {
        return Err(RuleViolation::TargetNotFound);
    }
    if !identity.follows(target_id) {
        return Err(RuleViolation::NotFollowing);
    }
    Ok(())
}

/// Any existing post may be liked or unliked by any identity
pub fn can_like(post: Option<&Post>) -> Result<&Post, RuleViolation> {
    post.ok_or(RuleViolation::PostNotFound)
}

/// Gate for post update and delete: the post must exist and belong to the
/// caller
pub fn authorize_post_change<'a>(
    identity: &Identity,
    post: Option<&'a Post>,
) -> Result<&'a Post, RuleViolation> {
    let post = post.ok_or(RuleViolation::PostNotFound)?;

    if !can_modify_post(identity, post) {
        return Err(RuleViolation::NotPostOwner);
    }

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use chrono::Utc;
    use std::collections::BTreeSet;

    fn account(name: &str) -> Account {
        let now = Utc::now();
        Account {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{}@x.com", name),
            password_hash: String::new(),
            profile: Profile::default(),
            followers: BTreeSet::new(),
            followings: BTreeSet::new(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn post_by(owner: &Account) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            owner_id: owner.id,
            desc: Some("hello".to_string()),
            img: None,
            likes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_only_owner_may_modify_post() {
        let alice = account("alice");
        let bob = account("bob");
        let post = post_by(&alice);

        assert!(can_modify_post(&Identity::new(alice.clone()), &post));
        assert!(!can_modify_post(&Identity::new(bob.clone()), &post));

        assert_eq!(
            authorize_post_change(&Identity::new(alice), Some(&post)).unwrap().id,
            post.id
        );
        assert_eq!(
            authorize_post_change(&Identity::new(bob), Some(&post)),
            Err(RuleViolation::NotPostOwner)
        );
    }

    #[test]
    fn test_missing_post_is_reported_before_ownership() {
        let alice = Identity::new(account("alice"));
        assert_eq!(
            authorize_post_change(&alice, None),
            Err(RuleViolation::PostNotFound)
        );
        assert_eq!(can_like(None), Err(RuleViolation::PostNotFound));
    }

    #[test]
    fn test_follow_rules() {
        let mut alice = account("alice");
        let bob = account("bob");

        let identity = Identity::new(alice.clone());
        assert_eq!(
            can_follow(&identity, alice.id, Some(&alice)),
            Err(RuleViolation::SelfFollow)
        );
        assert_eq!(
            can_follow(&identity, bob.id, None),
            Err(RuleViolation::TargetNotFound)
        );
        assert_eq!(can_follow(&identity, bob.id, Some(&bob)), Ok(()));

        alice.followings.insert(bob.id);
        let identity = Identity::new(alice);
        assert_eq!(
            can_follow(&identity, bob.id, Some(&bob)),
            Err(RuleViolation::AlreadyFollowing)
        );
    }

    #[test]
    fn test_self_follow_wins_over_missing_target() {
        let alice = account("alice");
        let identity = Identity::new(alice.clone());

        assert_eq!(
            can_follow(&identity, alice.id, None),
            Err(RuleViolation::SelfFollow)
        );
        assert_eq!(
            can_unfollow(&identity, alice.id, None),
            Err(RuleViolation::SelfFollow)
        );
    }

    #[test]
    fn test_unfollow_rules() {
        let mut alice = account("alice");
        let bob = account("bob");

        assert_eq!(
            can_unfollow(&Identity::new(alice.clone()), bob.id, Some(&bob)),
            Err(RuleViolation::NotFollowing)
        );
        assert_eq!(
            can_unfollow(&Identity::new(alice.clone()), bob.id, None),
            Err(RuleViolation::TargetNotFound)
        );

        alice.followings.insert(bob.id);
        assert_eq!(
            can_unfollow(&Identity::new(alice), bob.id, Some(&bob)),
            Ok(())
        );
    }
}
