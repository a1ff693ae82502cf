//! Relay load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                      RELAY                        │
//!                         │                                                   │
//!     Client Request      │  ┌─────────┐    ┌───────────┐    ┌────────────┐  │
//!     ────────────────────┼─▶│  http   │───▶│  routing  │───▶│  service   │  │
//!                         │  │ server  │    │   tree    │    │  registry  │  │
//!                         │  └─────────┘    └───────────┘    └─────┬──────┘  │
//!                         │                                        │         │
//!                         │                                        ▼         │
//!                         │                                 ┌────────────┐   │
//!                         │                                 │  balancer  │   │
//!                         │                                 │ rr / least │   │
//!                         │                                 └─────┬──────┘   │
//!                         │                                       │          │
//!     Client Response     │  ┌─────────┐    ┌───────────┐         ▼          │
//!     ◀───────────────────┼──│dispatch │◀───│  forward  │◀─── backend slot ──┼──── Backend
//!                         │  └─────────┘    └───────────┘                    │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use relay::config::load_config;
use relay::lifecycle::{build_server, signals, Shutdown};
use relay::observability::init_logging;

#[derive(Parser)]
#[command(name = "relay")]
#[command(about = "Path-routing HTTP load balancer", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "CONFIG_PATH", default_value = "configs/relay.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    init_logging(&config.logging);

    tracing::info!(
        config = %cli.config.display(),
        bind_address = %config.global.bind_address(),
        services = config.services.len(),
        routes = config.routes.len(),
        "relay v0.1.0 starting"
    );

    let server = build_server(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let _signals = signals::spawn_signal_listener(shutdown);

    let outcome = server.start(server_shutdown).await?;
    if outcome.is_forced() {
        tracing::warn!("Forced shutdown");
        std::process::exit(1);
    }

    tracing::info!("Server exited gracefully");
    Ok(())
}
