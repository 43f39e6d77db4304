//! Gateway configuration.

use std::path::PathBuf;

use clap::Parser;
use gridwire_core::GridConfig;
use gridwire_proto::{DEFAULT_PAGE_SIZE, MAX_FILTER_SLOTS};

/// gridwire HTTP gateway command line arguments.
#[derive(Debug, Parser)]
#[command(name = "gridwire-gateway")]
#[command(about = "HTTP gateway for DataTables and ExtJS grids")]
pub struct Args {
    /// Address to listen on for HTTP requests.
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    pub listen: String,

    /// JSON fixture file with the resources to serve.
    #[arg(short, long)]
    pub fixtures: Option<PathBuf>,

    /// strftime pattern for date cells and date filter values.
    #[arg(long, default_value = gridwire_core::DEFAULT_DATE_FORMAT)]
    pub date_format: String,

    /// Page size used when the client sends none.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Maximum number of ExtJS filter slots read per request.
    #[arg(long, default_value_t = MAX_FILTER_SLOTS)]
    pub max_filters: usize,

    /// Include backend messages and error traces in failure envelopes.
    #[arg(long)]
    pub debug: bool,
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to listen on for HTTP requests.
    pub listen_addr: String,
    /// Fixture file loaded at startup.
    pub fixtures: Option<PathBuf>,
    /// Grid engine settings.
    pub grid: GridConfig,
}

impl From<&Args> for GatewayConfig {
    fn from(args: &Args) -> Self {
        let mut grid = GridConfig::new()
            .with_default_page_size(args.page_size)
            .with_max_filter_slots(args.max_filters)
            .with_debug(args.debug);
        // Validated by the binary before serving.
        grid.date_format = args.date_format.clone();

        Self {
            listen_addr: args.listen.clone(),
            fixtures: args.fixtures.clone(),
            grid,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            fixtures: None,
            grid: GridConfig::default(),
        }
    }
}
