//! Account model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt, str::FromStr};
use uuid::Uuid;

/// Relationship status shown on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    Single,
    Married,
    Complicated,
}

impl Relationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relationship::Single => "single",
            Relationship::Married => "married",
            Relationship::Complicated => "complicated",
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Relationship {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Relationship::Single),
            "married" => Ok(Relationship::Married),
            "complicated" => Ok(Relationship::Complicated),
            other => Err(format!("unknown relationship status: {}", other)),
        }
    }
}

/// Free-form profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
    pub profile_picture: String,
    pub cover_picture: String,
    pub desc: String,
    pub city: String,
    pub from: String,
    pub relationship: Option<Relationship>,
}

/// Account entity
///
/// `followers` and `followings` are the two halves of the follow graph: B is
/// in A's `followings` exactly when A is in B's `followers`. Stores keep the
/// halves in sync; nothing else writes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
    pub followers: BTreeSet<Uuid>,
    pub followings: BTreeSet<Uuid>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether this account follows `id`
    pub fn follows(&self, id: Uuid) -> bool {
        self.followings.contains(&id)
    }

    /// Public representation, without the password hash
    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            profile_picture: self.profile.profile_picture.clone(),
            cover_picture: self.profile.cover_picture.clone(),
            followers: self.followers.iter().copied().collect(),
            followings: self.followings.iter().copied().collect(),
            desc: self.profile.desc.clone(),
            city: self.profile.city.clone(),
            from: self.profile.from.clone(),
            relationship: self.profile.relationship,
            is_admin: self.is_admin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// New account creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Validated profile changes
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_picture: Option<String>,
    pub desc: Option<String>,
    pub city: Option<String>,
    pub from: Option<String>,
    pub relationship: Option<Relationship>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        *self == ProfileChanges::default()
    }

    /// Apply the changes to an in-memory account
    pub fn apply(self, account: &mut Account) {
        if let Some(username) = self.username {
            account.username = username;
        }
        if let Some(password_hash) = self.password_hash {
            account.password_hash = password_hash;
        }
        let profile = &mut account.profile;
        if let Some(value) = self.profile_picture {
            profile.profile_picture = value;
        }
        if let Some(value) = self.cover_picture {
            profile.cover_picture = value;
        }
        if let Some(value) = self.desc {
            profile.desc = value;
        }
        if let Some(value) = self.city {
            profile.city = value;
        }
        if let Some(value) = self.from {
            profile.from = value;
        }
        if let Some(value) = self.relationship {
            profile.relationship = Some(value);
        }
    }
}

/// Account as returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub profile_picture: String,
    pub cover_picture: String,
    pub followers: Vec<Uuid>,
    pub followings: Vec<Uuid>,
    pub desc: String,
    pub city: String,
    pub from: String,
    pub relationship: Option<Relationship>,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for account registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for login
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request for profile update
///
/// Only the listed keys are settable; any other key fails deserialization
/// and the whole update is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub profile_picture: Option<String>,
    pub cover_picture: Option<String>,
    pub desc: Option<String>,
    pub city: Option<String>,
    pub from: Option<String>,
    pub relationship: Option<Relationship>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_rejects_unknown_fields() {
        let err = serde_json::from_str::<UpdateProfileRequest>(r#"{"isAdmin": true}"#)
            .expect_err("isAdmin must not be settable");
        assert!(err.to_string().contains("unknown field"));

        let err = serde_json::from_str::<UpdateProfileRequest>(
            r#"{"city": "Douala", "followers": []}"#,
        )
        .expect_err("followers must not be settable");
        assert!(err.to_string().contains("followers"));
    }

    #[test]
    fn test_update_request_accepts_allow_list() {
        let request: UpdateProfileRequest = serde_json::from_str(
            r#"{
                "username": "bob",
                "password": "Xyz789?",
                "profilePicture": "https://cdn.example.com/p.png",
                "coverPicture": "https://cdn.example.com/c.png",
                "desc": "hello",
                "city": "Yaounde",
                "from": "Buea",
                "relationship": "married"
            }"#,
        )
        .unwrap();
        assert_eq!(request.username.as_deref(), Some("bob"));
        assert_eq!(request.from.as_deref(), Some("Buea"));
        assert_eq!(request.relationship, Some(Relationship::Married));
    }

    #[test]
    fn test_relationship_round_trips_through_text() {
        for status in [
            Relationship::Single,
            Relationship::Married,
            Relationship::Complicated,
        ] {
            assert_eq!(status.as_str().parse::<Relationship>(), Ok(status));
        }
        assert!("divorced".parse::<Relationship>().is_err());
    }

    #[test]
    fn test_view_omits_password_hash() {
        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            profile: Profile::default(),
            followers: BTreeSet::new(),
            followings: BTreeSet::new(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_string(&account.view()).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"isAdmin\":false"));
    }

    #[test]
    fn test_apply_changes_only_touches_present_fields() {
        let now = Utc::now();
        let mut account = Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            profile: Profile {
                city: "Douala".to_string(),
                ..Profile::default()
            },
            followers: BTreeSet::new(),
            followings: BTreeSet::new(),
            is_admin: false,
            created_at: now,
            updated_at: now,
        };

        ProfileChanges {
            desc: Some("hi".to_string()),
            ..ProfileChanges::default()
        }
        .apply(&mut account);

        assert_eq!(account.profile.desc, "hi");
        assert_eq!(account.profile.city, "Douala");
        assert_eq!(account.username, "alice");
    }
}
