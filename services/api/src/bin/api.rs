//! services/api/src/bin/api.rs

use job_board_api::{
    adapters::{DbAdapter, JSearchAdapter, LocalFileStorage, MemoryDbAdapter},
    config::Config,
    error::ApiError,
    seed::{ensure_admin, SeedOutcome},
    web::{app_router, AppState},
};
use job_board_core::ports::DatabaseService;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store & Run Migrations ---
    let db: Arc<dyn DatabaseService> = if config.uses_memory_store() {
        warn!("Using the in-memory store; data is lost on restart.");
        Arc::new(MemoryDbAdapter::new())
    } else {
        info!("Connecting to database...");
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&config.database_url)
            .await?;
        let db_adapter = DbAdapter::new(db_pool);
        info!("Running database migrations...");
        db_adapter.run_migrations().await?;
        info!("Database migrations complete.");
        Arc::new(db_adapter)
    };

    // --- 3. Seed the Admin Account ---
    if let Some((email, password)) = config.admin_credentials() {
        match ensure_admin(db.as_ref(), email, password).await? {
            SeedOutcome::Created(_) => info!("Admin account created."),
            SeedOutcome::AlreadyExists => info!("Admin account already present."),
        }
    }

    // --- 4. Initialize Service Adapters ---
    if config.jsearch_api_key.is_none() {
        warn!("JSEARCH_API_KEY is not set; external job listings are disabled.");
    }
    let external_jobs = Arc::new(
        JSearchAdapter::new(
            config.jsearch_api_key.clone(),
            config.jsearch_base_url.clone(),
            config.jsearch_timeout,
        )
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {e}")))?,
    );
    let file_storage = Arc::new(LocalFileStorage::new(
        config.uploads_dir.clone(),
        &config.public_base_url,
    ));

    // --- 5. Build the Shared AppState & Router ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        db,
        external_jobs,
        file_storage,
    ));
    let app = app_router(app_state);

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for the shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received.");
}
