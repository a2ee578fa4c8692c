mod api;
mod db;
mod metrics;
mod notes;
mod state;

use crate::db::init_db;
use crate::notes::NotesStore;
use crate::state::AppState;
use anyhow::Result;
use credentials_common::config::AppConfig;
use credentials_common::storage::LocalFileStore;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = AppConfig::from_env()?;
    let db = init_db(&config.database_url, config.db_max_connections).await?;

    tokio::fs::create_dir_all(&config.media_root).await?;
    let files = LocalFileStore::new(config.media_root.clone(), config.media_url.clone());

    let state = AppState {
        db,
        files: Arc::new(files),
        media_root: config.media_root.clone(),
        media_url: config.media_url.clone(),
        notes: NotesStore::default(),
        notes_enabled: config.notes_enabled,
    };

    let listen_addr = config.listen_addr.clone();
    let api_task = tokio::spawn(async move {
        let app = api::router(state);
        match tokio::net::TcpListener::bind(&listen_addr).await {
            Ok(listener) => {
                info!("credentials service listening on {}", listen_addr);
                if let Err(err) = axum::serve(listener, app).await {
                    warn!("credentials service exited: {}", err);
                }
            }
            Err(err) => warn!("failed to bind {}: {}", listen_addr, err),
        }
    });

    tokio::select! {
        _ = api_task => {},
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    Ok(())
}
