use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mieszkanieo_core::{
    load_config, validate_config, JobOrchestrator, JobStore, ListingStore, ProcessSiteScraper,
    SiteScraper, SqliteJobStore, SqliteListingStore,
};
use mieszkanieo_server::api::create_router;
use mieszkanieo_server::state::AppState;

/// How often finished jobs past their retention are pruned
const PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

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
    let config_path = std::env::var("MIESZKANIEO_CONFIG")
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
    info!("Scraper program: {} {:?}", config.scraper.program, config.scraper.args);

    // Both tables live in the same SQLite file
    let job_store: Arc<dyn JobStore> = Arc::new(
        SqliteJobStore::new(&config.database.path).context("Failed to create job store")?,
    );
    info!("Job store initialized");

    let listing_store: Arc<dyn ListingStore> = Arc::new(
        SqliteListingStore::new(&config.database.path)
            .context("Failed to create listing store")?,
    );
    info!("Listing store initialized");

    let known_sites = config.scraper.site_ids();
    let scraper: Arc<dyn SiteScraper> = Arc::new(ProcessSiteScraper::new(config.scraper.clone()));
    info!("Site scraper initialized for sites: {:?}", known_sites);

    let orchestrator = JobOrchestrator::new(
        config.orchestrator.clone(),
        Arc::clone(&job_store),
        Arc::clone(&listing_store),
        scraper,
        known_sites,
    );

    // Prune old finished jobs if retention is configured
    let prune_handle = config.orchestrator.retention_days.map(|days| {
        info!("Pruning finished jobs older than {} days", days);
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                if let Err(e) = orchestrator.prune_finished(days) {
                    warn!("Failed to prune finished jobs: {}", e);
                }
            }
        })
    });

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        job_store,
        listing_store,
        orchestrator.clone(),
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

    info!("Server shutting down...");

    if let Some(handle) = prune_handle {
        handle.abort();
    }

    // Running jobs are recorded as failed rather than left running forever
    orchestrator.shutdown().await;
    info!("Orchestrator stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
