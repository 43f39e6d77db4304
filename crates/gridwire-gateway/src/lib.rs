//! gridwire HTTP gateway.
//!
//! Serves DataTables and ExtJS grid endpoints over HTTP for resources held
//! in a [`ResourceRegistry`].

pub mod config;
pub mod error;
pub mod fixtures;
pub mod json;
pub mod routes;

pub use config::{Args, GatewayConfig};
pub use error::GatewayError;

use std::sync::Arc;

use axum::Router;
use gridwire_core::{MemoryTable, ResourceRegistry};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Registered resources.
    pub registry: Arc<ResourceRegistry<MemoryTable>>,
    /// Gateway configuration.
    pub config: GatewayConfig,
}

impl AppState {
    /// Create new application state.
    pub fn new(registry: ResourceRegistry<MemoryTable>, config: GatewayConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }
}

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::datatable::routes())
        .merge(routes::grid::routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
