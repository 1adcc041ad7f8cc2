//! Social backend core
//!
//! Account registration and login, cookie sessions, the follow graph and a
//! post timeline, served over HTTP with axum.

pub mod config;
pub mod error;
pub mod graph;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod rules;
pub mod state;
pub mod timeline;
pub mod validation;

pub use state::AppState;
