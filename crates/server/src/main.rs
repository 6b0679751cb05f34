use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use papermill_core::{
    load_config, validate_config, BackgroundExecutor, BatchCoordinator, CommandEngine,
    DocumentProcessor, DocumentStore, ModelLoader, SqliteDocumentStore, SqliteTaskStore,
    TaskStore, WorkerPool,
};

use papermill_server::api::create_router;
use papermill_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
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
    let config_path = std::env::var("PAPERMILL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    info!("Upload directory: {:?}", config.storage.upload_dir);
    info!("Model directory: {:?}", config.engine.model_dir);

    // Create SQLite task store
    let tasks: Arc<dyn TaskStore> = Arc::new(
        SqliteTaskStore::new(&config.database.path).context("Failed to create task store")?,
    );
    info!("Task store initialized");

    // Create document store (catalog + upload directory)
    let documents: Arc<dyn DocumentStore> = Arc::new(
        SqliteDocumentStore::new(&config.database.path, config.storage.upload_dir.clone())
            .context("Failed to create document store")?,
    );
    info!("Document store initialized");

    // Load models before accepting any traffic. Nothing is served until
    // the handle is ready, so handlers never race model initialization.
    std::fs::create_dir_all(&config.engine.model_dir)
        .with_context(|| format!("Failed to create {:?}", config.engine.model_dir))?;
    let models = Arc::new(ModelLoader::new(config.engine.clone()));
    let handle = models
        .initialize()
        .await
        .context("Failed to load models")?;
    info!(
        "Loaded {} model file(s) ({} bytes) from {:?}",
        handle.models().len(),
        handle.total_size_bytes(),
        handle.model_dir()
    );

    // Engine, processor, and the shared worker pool
    let engine = Arc::new(CommandEngine::new(config.engine.command.clone()));
    let processor = DocumentProcessor::new(
        Arc::clone(&engine),
        Arc::clone(&models),
        config.processor.clone(),
    );
    let pool = WorkerPool::new(&config.pool);
    info!("Worker pool sized at {} workers", pool.max_workers());

    let executor = BackgroundExecutor::new(processor.clone(), Arc::clone(&tasks), pool.clone());
    let coordinator = BatchCoordinator::new(processor, pool.clone());

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        models,
        tasks,
        documents,
        executor,
        coordinator,
        pool,
    ));

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
