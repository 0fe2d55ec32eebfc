use std::sync::Arc;

use anyhow::Context;
use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use casefile::{
    config::{AppConfig, StorageBackend},
    db, routes, s3,
    state::AppState,
    storage::{BlobStore, MemoryBlobStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.database_url,
        pool_size = config.database_max_pool_size,
        storage_backend = ?config.storage_backend,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    db::run_migrations(&pool)?;

    let blobs: Arc<dyn BlobStore> = match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory blob storage; uploaded files are lost on restart");
            Arc::new(MemoryBlobStore::new())
        }
        StorageBackend::S3 => Arc::new(s3::build_blob_store(&config).await?),
    };

    let addr = config.listen_addr();
    let state = AppState::new(pool, config, blobs);
    let app = routes::create_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if signal::ctrl_c().await.is_ok() {
        tracing::info!("received shutdown signal");
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
