//! Stratus server binary
//!
//! Starts the UDP ingest listener and the HTTP API over one shared store.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stratus::api::{serve, AppState};
use stratus::chart::ChartRenderer;
use stratus::config::{generate_default_config, Config};
use stratus::ingest;
use stratus::store::{DeviceDirectory, WeatherStore};

#[derive(Parser)]
#[command(name = "stratus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Home weather-station chart service")]
struct Cli {
    /// Path to a TOML config file (default: per-user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a default config file to stdout
    GenerateConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::GenerateConfig) = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_logging(&config);

    tracing::info!("Stratus v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {:?}", config.database.path);

    let store = Arc::new(Mutex::new(WeatherStore::open(Path::new(&config.database.path))?));
    let devices = Arc::new(DeviceDirectory::new());
    let renderer = ChartRenderer::new(config.plot.clone());

    let ingest_handle = if config.ingest.enabled {
        let ingest_config = config.ingest.clone();
        let ingest_store = Arc::clone(&store);
        let ingest_devices = Arc::clone(&devices);
        Some(tokio::spawn(async move {
            if let Err(err) = ingest::run(ingest_config, ingest_store, ingest_devices).await {
                tracing::error!(%err, "ingest listener failed");
            }
        }))
    } else {
        tracing::info!("UDP ingest disabled by config");
        None
    };

    let state = AppState::new(store, devices, renderer, config.api.clone());
    serve(state).await?;

    if let Some(handle) = ingest_handle {
        handle.abort();
    }

    tracing::info!("Stratus shutdown complete");
    Ok(())
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("stratus={}", config.logging.level)),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
