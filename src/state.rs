//! Shared application state injected into handlers and middleware.

use std::sync::Arc;

use crate::{config::Config, db::DbPool};

/// State shared across the router: the database pool plus the loaded
/// configuration (quota limits, body cap, webhook secret).
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}
