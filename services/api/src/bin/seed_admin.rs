//! services/api/src/bin/seed_admin.rs
//!
//! Creates the admin account from `ADMIN_EMAIL` / `ADMIN_PASSWORD` in the
//! PostgreSQL database named by `DATABASE_URL`, then exits.

use job_board_api::{
    adapters::DbAdapter,
    config::{Config, ConfigError},
    error::ApiError,
    seed::{ensure_admin, SeedOutcome},
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let (email, password) = config.admin_credentials().ok_or_else(|| {
        ConfigError::MissingVar("ADMIN_EMAIL and ADMIN_PASSWORD".to_string())
    })?;
    if config.uses_memory_store() {
        return Err(ConfigError::InvalidValue(
            "DATABASE_URL".to_string(),
            "seeding needs a persistent database".to_string(),
        )
        .into());
    }

    let db_pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    let db = DbAdapter::new(db_pool);
    db.run_migrations().await?;

    match ensure_admin(&db, email, password).await? {
        SeedOutcome::Created(admin) => info!("Admin user created: {}", admin.email),
        SeedOutcome::AlreadyExists => info!("Admin user already exists: {}", email),
    }
    Ok(())
}
