//! Social service models

pub mod account;
pub mod post;

// Re-export for convenience
pub use account::{
    Account, AccountView, LoginRequest, NewAccount, Profile, ProfileChanges, RegisterRequest,
    Relationship, UpdateProfileRequest,
};
pub use post::{
    LikeState, NewPost, Post, PostChanges, PostView, CreatePostRequest, UpdatePostRequest,
};
