//! healthz-console entry point.
//!
//! Initializes tracing, loads the TOML configuration, derives the backend URL
//! from the environment, builds the page controller and serves the page.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use healthz_console::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use healthz_console::controller::PageController;
use healthz_console::http::start_server;
use healthz_console::probe::HttpProbe;
use healthz_console::routes::create_router;
use healthz_console::state::AppState;
use healthz_console::templates::init_templates;

/// healthz-console: check a backend's /api/healthz from a web page
#[derive(Parser, Debug)]
#[command(name = "healthz-console", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "healthz_console=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration is needed before tracing to pick the log format
    let config = AppConfig::load(&args.config)?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(config = %args.config, "Loaded configuration");

    let probe = Arc::new(HttpProbe::new()?);

    // Missing or blank BACK_BASE_URL / BACK_BASE_PORT stops startup here
    let page = PageController::from_env(probe).inspect_err(|e| {
        tracing::error!(error = %e, "Backend address is not configured");
    })?;
    tracing::info!(url = %page.url(), "Derived backend health URL");

    let tera = init_templates()?;
    tracing::info!("Initialized templates");

    let state = AppState::new(config.clone(), tera, page);
    let app = create_router(state);

    start_server(app, &config).await?;

    Ok(())
}
