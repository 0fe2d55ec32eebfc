use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{SqlitePool, SqlitePooledConnection},
    error::{AppError, AppResult},
    storage::BlobStore,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<AppConfig>,
    pub blobs: Arc<dyn BlobStore>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: AppConfig, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            blobs,
        }
    }

    /// Checks out a connection for the duration of one request; it returns to
    /// the pool when dropped.
    pub fn db(&self) -> AppResult<SqlitePooledConnection> {
        self.pool
            .get()
            .map_err(|err| AppError::internal(format!("database pool error: {err}")))
    }
}
