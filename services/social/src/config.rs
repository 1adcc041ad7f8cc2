//! Server configuration loaded from the environment

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// Which store implementation backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    Memory,
}

/// Server configuration
///
/// # Environment Variables
/// - `BIND_ADDRESS`: Interface to listen on (default: 0.0.0.0)
/// - `PORT`: Port to listen on (default: 3001)
/// - `APP_ENV`: `production` turns on `Secure` cookies (default: development)
/// - `STORAGE`: `postgres` or `memory` (default: postgres)
/// - `UNIFORM_LOGIN_ERRORS`: Answer unknown email and wrong password alike
///   (default: false)
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub app_env: String,
    pub storage: StorageBackend,
    pub uniform_login_errors: bool,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_source(Environment::default().try_parsing(true))
    }

    fn from_source(environment: Environment) -> Result<Self> {
        let config = Config::builder()
            .set_default("bind_address", "0.0.0.0")?
            .set_default("port", 3001_i64)?
            .set_default("app_env", "development")?
            .set_default("storage", "postgres")?
            .set_default("uniform_login_errors", false)?
            .add_source(environment)
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Socket address string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 3001,
            app_env: "development".to_string(),
            storage: StorageBackend::Postgres,
            uniform_login_errors: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_source(Environment::default().try_parsing(true).source(Some(source)))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.listen_address(), "0.0.0.0:3001");
        assert_eq!(config.storage, StorageBackend::Postgres);
        assert!(!config.is_production());
        assert!(!config.uniform_login_errors);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PORT", "8080"),
            ("APP_ENV", "production"),
            ("STORAGE", "memory"),
            ("UNIFORM_LOGIN_ERRORS", "true"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.uniform_login_errors);
    }

    #[test]
    fn test_rejects_unknown_storage() {
        assert!(load(&[("STORAGE", "mongodb")]).is_err());
    }
}
