//! netpool-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use netpool_gateway::api;
use netpool_gateway::app_state::AppState;
use netpool_gateway::config::{GatewayConfig, LogFormat};
use netpool_gateway::domain::{EventBus, InMemoryObjectRegistry, ObjectRegistry, PoolRegistry};
use netpool_gateway::persistence::{
    InMemoryMembershipStore, MembershipStore, PostgresPersistence, event_log,
};
use netpool_gateway::service::{InventoryService, MembershipService, UpdateTrigger};

const PRUNE_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting netpool-gateway");

    let catalog = Arc::new(
        config
            .load_catalog()
            .context("failed to load custom properties")?,
    );

    // Build domain layer
    let pools = Arc::new(PoolRegistry::new());
    let objects = Arc::new(InMemoryObjectRegistry::new());
    let event_bus = EventBus::new(config.event_bus_capacity);

    // Build persistence layer
    let store = build_store(&config).await?;
    if config.event_log_enabled {
        event_log::spawn_event_log(&event_bus, Arc::clone(&store));
        if config.event_retention_days > 0 {
            spawn_pruner(Arc::clone(&store), config.event_retention_days);
        }
    }

    // Build service layer
    let membership_service = Arc::new(MembershipService::new(
        pools,
        Arc::clone(&objects) as Arc<dyn ObjectRegistry>,
        Arc::clone(&store),
        Arc::clone(&catalog),
        event_bus.clone(),
        config.recompute_settings(),
    ));
    membership_service
        .restore()
        .await
        .context("failed to restore pools")?;
    let inventory_service = Arc::new(InventoryService::new(objects, catalog));
    inventory_service
        .register_trigger(Arc::clone(&membership_service) as Arc<dyn UpdateTrigger>)
        .await;

    // Build application state
    let app_state = AppState {
        membership_service,
        inventory_service,
        event_bus,
        store,
    };
    let app = api::build_app(app_state, Duration::from_secs(config.request_timeout_secs));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Connects to PostgreSQL and applies migrations when persistence is
/// enabled; otherwise keeps membership in memory.
async fn build_store(config: &GatewayConfig) -> anyhow::Result<Arc<dyn MembershipStore>> {
    if !config.persistence_enabled {
        tracing::info!("persistence disabled, using in-memory membership store");
        return Ok(Arc::new(InMemoryMembershipStore::new()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("failed to connect to PostgreSQL")?;
    let persistence = PostgresPersistence::new(pool);
    persistence
        .migrate(&config.migrations_dir)
        .await
        .context("failed to run migrations")?;
    tracing::info!("connected to PostgreSQL membership store");
    Ok(Arc::new(persistence))
}

/// Deletes logged events past the retention window once an hour.
fn spawn_pruner(store: Arc<dyn MembershipStore>, days: u64) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            match store.prune_events(days).await {
                Ok(0) => {}
                Ok(deleted) => tracing::info!(deleted, "pruned old pool events"),
                Err(e) => tracing::warn!(error = %e, "failed to prune pool events"),
            }
        }
    });
}
