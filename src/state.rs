use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AppConfig;
use crate::security::jwt::TokenService;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub pool: PgPool,
    pub config: AppConfig,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, tokens: TokenService) -> Self {
        Self {
            pool,
            config,
            tokens,
        }
    }
}

/// Type alias used in handler signatures.
pub type SharedState = Arc<AppState>;
