//! beats-interaction - Interaction service daemon
//!
//! Runs the event projection pipeline: broker connection supervisor,
//! sequential event consumer, projection mutators and dead-letter
//! publisher. The moderation surface lives in the library and is served by
//! the platform's route layer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use beats_interaction::broker::{ConnectionSupervisor, DeadLetterPublisher};
use beats_interaction::ingest::EventProcessor;
use beats_interaction::{db, Config};

/// Command-line arguments for beats-interaction
#[derive(Parser, Debug)]
#[command(name = "beats-interaction")]
#[command(about = "Interaction service for the beats platform")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "BEATS_INTERACTION_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file path
    #[arg(long, env = "BEATS_INTERACTION_DB")]
    database: Option<PathBuf>,

    /// Broker bootstrap list, host:port comma-separated
    #[arg(long, env = "BEATS_INTERACTION_BROKERS")]
    brokers: Option<String>,

    /// Enable or disable the event projection pipeline
    #[arg(long, env = "BEATS_INTERACTION_PROJECTIONS")]
    projections: Option<bool>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "beats_interaction=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!(
        "Starting beats-interaction v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Priority: CLI/env overrides > config file > defaults
    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if let Some(brokers) = args.brokers {
        config.broker.brokers = brokers;
    }
    if let Some(enabled) = args.projections {
        config.broker.enabled = enabled;
    }

    info!("Database path: {}", config.database_path.display());
    let pool = db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    if config.broker.enabled {
        let dead_letters = DeadLetterPublisher::connect(&config.broker)
            .context("Failed to create dead-letter producer")?;
        let processor = EventProcessor::new(pool.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let supervisor = ConnectionSupervisor::new(
            config.broker.clone(),
            processor,
            dead_letters,
            shutdown_rx,
        );
        let consumer_task = tokio::spawn(supervisor.run());

        shutdown_signal().await;

        // Let the in-flight message finish, then disconnect broker clients
        let _ = shutdown_tx.send(true);
        consumer_task
            .await
            .context("Event consumer task panicked")?;
    } else {
        info!("Event projections disabled; beats/users events will not be consumed");
        shutdown_signal().await;
    }

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
