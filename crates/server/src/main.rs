use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shorts_core::{
    load_config, validate_config, AssetStore, LocalAssetStore, RecordStore, SqliteRecordStore,
};
use shorts_server::api::create_router;
use shorts_server::state::{AppState, Collaborators};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SHORTS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint of the effective config
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);
    info!("Asset root: {:?}", config.storage.root);

    let fonts = shorts_core::video::font_status(&config.video);
    match &fonts.font_path {
        Some(path) if !fonts.degraded => info!("Subtitle font: {:?}", path),
        Some(path) => warn!("No Korean subtitle font found; falling back to {:?}", path),
        None => warn!("No subtitle font found; subtitles may not render"),
    }

    // Create SQLite record store
    let store: Arc<dyn RecordStore> = Arc::new(
        SqliteRecordStore::new(&config.database.path)
            .context("Failed to create record store")?,
    );
    info!("Record store initialized");

    // Create asset store
    tokio::fs::create_dir_all(&config.storage.root)
        .await
        .with_context(|| format!("Failed to create asset root {:?}", config.storage.root))?;
    let assets: Arc<dyn AssetStore> = Arc::new(LocalAssetStore::from_config(&config.storage));

    // Wire collaborators and stages
    let collaborators = Collaborators::from_config(&config);
    let state = Arc::new(AppState::new(config.clone(), store, assets, collaborators));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
