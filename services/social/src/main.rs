use anyhow::Result;
use common::database::{DatabaseConfig, health_check, init_pool};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use social::{
    AppState,
    config::{ServerConfig, StorageBackend},
    jwt::{JwtConfig, JwtService},
    password::PasswordService,
    repositories::{MemoryStore, PgStore},
    routes,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting social service");

    let server_config = ServerConfig::from_env()?;
    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let passwords = PasswordService::default();

    let app_state = match server_config.storage {
        StorageBackend::Postgres => {
            // Initialize database connection pool
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;

            // Check database connectivity
            if health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }

            let store = PgStore::new(pool);
            store.migrate().await?;

            AppState::new(store, jwt_service, passwords, server_config.clone())
        }
        StorageBackend::Memory => {
            info!("Using in-memory storage; data is lost on shutdown");
            AppState::new(
                MemoryStore::new(),
                jwt_service,
                passwords,
                server_config.clone(),
            )
        }
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let address = server_config.listen_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Social service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
