// Load configuration
// Set up logging
// Create database connection pool
// Initialize cache and indexer client
// Create shared state
// Start background project sync
// Start HTTP server

use portal_data_service::{
    api, cache, config::Config, db, indexer::GraphqlIndexer, service::HttpDomainProbe, service::SystemClock,
    state::{AppState, Dependencies},
};

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting portal-data-service");

    let config = Config::from_env();
    // Debug output masks credentials in connection strings
    tracing::info!("Configuration loaded: {:?}", config);

    // Setup database connection
    let db_pool = db::connection::establish_connection(&config.database_url).await?;
    sqlx::query("SELECT 1").execute(&db_pool).await?;
    tracing::info!("Database connection established");
    let store = Arc::new(db::SqliteStore::new(db_pool));

    let cache = cache::init_cache(&config).await?;
    let indexer = Arc::new(GraphqlIndexer::new(&config)?);
    let domain_probe = Arc::new(HttpDomainProbe::new(Duration::from_secs(config.indexer_timeout_secs))?);

    let deps = Dependencies {
        projects: store.clone(),
        favorites: store,
        indexer,
        cache,
        clock: Arc::new(SystemClock),
        domain_probe,
    };
    let app_state = Arc::new(AppState::new(config.clone(), deps));

    // Background reconciliation of known projections
    let shutdown = CancellationToken::new();
    let sync_task = tokio::spawn(app_state.sync.clone().run_sync_loop(
        config.supported_chains.clone(),
        Duration::from_secs(config.sync_interval_secs),
        shutdown.clone(),
    ));
    tracing::info!("Project sync task started");

    // Start HTTP server
    let app = api::create_router(app_state);
    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutdown signal received");
            server_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    sync_task.await?;
    tracing::info!("Server stopped");

    Ok(())
}
