//! Wizard entry point
//!
//! `wizard serve` runs the HTTP API, `wizard worker` polls the backend
//! for tasks.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use wizard_api::{config::Config, create_router, default_functions, default_state, logging};
use wizard_exec::{BackendClient, Worker};

#[derive(Parser)]
#[command(name = "wizard")]
#[command(about = "Wizard service - traced task execution and streaming")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, global = true, env = "OBW_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
    },

    /// Poll the backend for tasks
    Worker {
        /// Number of concurrent workers
        #[arg(short, long)]
        workers: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;

    logging::init_logging(&config.logging, config.is_production())?;
    wizard_trace::init_root_scope(config.trace.root_scope.clone());

    match cli.command {
        Commands::Serve { port, host } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            serve(&config).await?;
        }

        Commands::Worker { workers } => {
            if let Some(workers) = workers {
                config.worker.count = workers;
            }
            run_workers(&config).await?;
        }
    }

    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let router = create_router(default_state());

    tracing::info!("Starting wizard API on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    tracing::info!("Wizard API stopped");
    Ok(())
}

async fn run_workers(config: &Config) -> anyhow::Result<()> {
    let functions = Arc::new(default_functions());
    let source = Arc::new(BackendClient::new(&config.backend));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tracing::info!(
        "Starting {} worker(s) against {}",
        config.worker.count,
        config.backend.base_url
    );

    let handles: Vec<_> = (0..config.worker.count)
        .map(|id| {
            let worker = Worker::new(id, Arc::clone(&functions), Arc::clone(&source), &config.worker);
            let mut shutdown = shutdown_rx.clone();
            tokio::spawn(async move {
                worker
                    .run(async move {
                        let _ = shutdown.wait_for(|stop| *stop).await;
                    })
                    .await;
            })
        })
        .collect();

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown requested");
    shutdown_tx.send(true)?;

    for handle in handles {
        handle.await?;
    }
    Ok(())
}
