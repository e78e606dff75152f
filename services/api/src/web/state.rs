//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::token::TokenKeys;
use job_board_core::ports::{DatabaseService, ExternalJobService, FileStorageService};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub external_jobs: Arc<dyn ExternalJobService>,
    pub file_storage: Arc<dyn FileStorageService>,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        external_jobs: Arc<dyn ExternalJobService>,
        file_storage: Arc<dyn FileStorageService>,
    ) -> Self {
        let tokens = TokenKeys::new(&config.jwt_secret, config.jwt_expires_in_days);
        Self {
            db,
            config,
            external_jobs,
            file_storage,
            tokens,
        }
    }
}
