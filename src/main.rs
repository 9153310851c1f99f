//! Tallyd daemon entry point
//!
//! # Usage
//!
//! ```bash
//! tallyd start /etc/tallyd.json
//! tallyd start --host 0.0.0.0 /etc/tallyd.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use tallyd::{ClientInterface, ControlInterface, TallyStateManager, TallydConfig};

/// Camera tally distribution daemon
#[derive(Parser, Debug)]
#[command(name = "tallyd")]
#[command(about = "Camera tally distribution daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start tallyd.
    Start {
        /// Path to the JSON config file
        config: PathBuf,

        /// Host to bind both listeners to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tallyd=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Start { config, host } => start(&config, &host).await,
    }
}

async fn start(config_path: &std::path::Path, host: &str) -> anyhow::Result<()> {
    let config = TallydConfig::load(config_path)?;
    tracing::info!(
        "Loaded config: kinds {:?}, {} initial cameras",
        config.tally_kinds,
        config.initial_cameras
    );

    let manager = Arc::new(TallyStateManager::new(config.tally_kinds.clone())?);
    manager.set_max_camera(config.initial_cameras);

    let control = ControlInterface::new(Arc::clone(&manager))?;
    let indicator = ClientInterface::new(Arc::clone(&manager))?;

    let control_addr: SocketAddr = format!("{}:{}", host, config.control_port).parse()?;
    let client_addr: SocketAddr = format!("{}:{}", host, config.client_port).parse()?;

    let control_listener = TcpListener::bind(&control_addr).await?;
    let client_listener = TcpListener::bind(&client_addr).await?;
    tracing::info!("Control interface listening on {}", control_addr);
    tracing::info!("Indicator interface listening on {}", client_addr);

    tokio::join!(
        control.serve(control_listener),
        indicator.serve(client_listener),
    );
    Ok(())
}
