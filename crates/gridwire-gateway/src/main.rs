//! gridwire HTTP gateway binary.

use clap::Parser;
use gridwire_core::{config::validate_date_format, ResourceRegistry};
use gridwire_gateway::fixtures::{build_registry, load_fixtures};
use gridwire_gateway::{create_router, AppState, Args, GatewayConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line args
    let args = Args::parse();
    let config = GatewayConfig::from(&args);

    info!(
        listen = %config.listen_addr,
        date_format = %config.grid.date_format,
        debug = config.grid.debug,
        "Starting gridwire gateway"
    );

    validate_date_format(&config.grid.date_format)?;
    if config.grid.default_page_size == 0 {
        anyhow::bail!("page size must be greater than zero");
    }

    let registry = match &config.fixtures {
        Some(path) => {
            let registry = build_registry(&load_fixtures(path)?)?;
            info!(
                path = %path.display(),
                resources = registry.len(),
                "Loaded fixtures"
            );
            registry
        }
        None => {
            warn!("No fixture file given, serving an empty registry");
            ResourceRegistry::new()
        }
    };

    // Create application state
    let state = AppState::new(registry, config.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!("Gateway listening on {}", config.listen_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
