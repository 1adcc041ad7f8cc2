//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    graph::SocialGraph,
    jwt::JwtService,
    password::PasswordService,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{AccountStore, PostStore},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub posts: Arc<dyn PostStore>,
    pub graph: SocialGraph,
    pub jwt_service: JwtService,
    pub passwords: PasswordService,
    pub rate_limiter: RateLimiter,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Build the state around one store backing both accounts and posts
    pub fn new<S>(
        store: S,
        jwt_service: JwtService,
        passwords: PasswordService,
        config: ServerConfig,
    ) -> Self
    where
        S: AccountStore + PostStore + Clone + 'static,
    {
        let accounts: Arc<dyn AccountStore> = Arc::new(store.clone());
        let posts: Arc<dyn PostStore> = Arc::new(store);

        Self {
            graph: SocialGraph::new(accounts.clone(), posts.clone()),
            accounts,
            posts,
            jwt_service,
            passwords,
            rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
            config: Arc::new(config),
        }
    }

    /// Replace the login throttle
    pub fn with_rate_limiter(mut self, config: RateLimiterConfig) -> Self {
        self.rate_limiter = RateLimiter::new(config);
        self
    }
}
