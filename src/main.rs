//! `gym-checkin` command-line entry point.
//!
//! - `serve` runs the HTTP API.
//! - `kiosk` reads scanned codes from standard input, one per line, and
//!   prints the check-in result for each.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{Level, info, warn};
use tracing_subscriber::EnvFilter;

use gym_checkin::api::{AppState, create_router};
use gym_checkin::checkin::CheckInService;
use gym_checkin::clock::SystemClock;
use gym_checkin::config::ConfigLoader;
use gym_checkin::scanner::{LineScanner, scan_and_check_in};
use gym_checkin::store::SqliteStore;

/// Command-line arguments for gym-checkin
#[derive(Parser, Debug)]
#[command(name = "gym-checkin")]
#[command(about = "Gym membership registration and QR check-in")]
#[command(version)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "GYM_CONFIG", default_value = "./config/gym.yaml")]
    config: PathBuf,

    /// Database URL, overriding the configuration file
    #[arg(long, env = "GYM_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Listen address, overriding the configuration file
        #[arg(long, env = "GYM_LISTEN_ADDR")]
        listen_addr: Option<String>,
    },
    /// Check members in from scanned codes read on standard input
    Kiosk,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ConfigLoader::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(url) = cli.database_url {
        config = config.with_database_url(url);
    }

    match cli.command {
        Command::Serve { listen_addr } => {
            if let Some(addr) = listen_addr {
                config = config.with_listen_addr(addr);
            }
            serve(config).await
        }
        Command::Kiosk => kiosk(config).await,
    }
}

async fn open_store(config: &ConfigLoader) -> Result<Arc<SqliteStore>> {
    let database = &config.config().database;
    let store = SqliteStore::connect(&database.url, database.max_connections)
        .await
        .with_context(|| format!("Failed to connect to {}", database.url))?;
    store.migrate().await.context("Failed to create schema")?;
    info!(url = %database.url, "Record store ready");
    Ok(Arc::new(store))
}

async fn serve(config: ConfigLoader) -> Result<()> {
    let store = open_store(&config).await?;
    let listen_addr = config.config().server.listen_addr.clone();

    let state = AppState::new(store.clone(), Arc::new(SystemClock), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", listen_addr))?;
    info!(listen_addr = %listen_addr, "Starting HTTP server");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("Server error")?;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn kiosk(config: ConfigLoader) -> Result<()> {
    let store = open_store(&config).await?;
    let service = CheckInService::new(store.clone(), Arc::new(SystemClock), config);

    let stop = CancellationToken::new();
    tokio::spawn(watch_ctrl_c(stop.clone()));

    info!("Kiosk ready, waiting for scans");
    let mut scanner = LineScanner::new(BufReader::new(tokio::io::stdin()));
    loop {
        let round = scan_and_check_in(&service, scanner, &stop).await;
        match round.result {
            Some(Ok(outcome)) => println!("{}: {}", outcome.display_name(), outcome),
            Some(Err(err)) => println!("{}", err),
            None => break,
        }
        match round.scanner {
            Some(next) => scanner = next,
            None => {
                warn!("Scanner stopped unexpectedly");
                break;
            }
        }
    }

    store.close().await;
    info!("Kiosk stopped");
    Ok(())
}

async fn watch_ctrl_c(token: CancellationToken) {
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received Ctrl+C, shutting down");
            token.cancel();
        }
        Err(e) => warn!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
