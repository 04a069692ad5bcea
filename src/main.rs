//! relay-gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌───────────────────────────────────────────────────────┐
//!                 │                    RELAY GATEWAY                        │
//!                 │                                                         │
//!  Client ────────┼─▶ net listener ─▶ http server ─▶ routing classifier    │
//!                 │                    (upgrade gate)        │              │
//!                 │                                          ├─▶ relay ─────┼──▶ Relay
//!                 │                                          ├─▶ assets     │    process
//!                 │                                          └─▶ 404        │
//!                 │                                                         │
//!  Client ◀───────┼── isolation headers (COOP / COEP) on every response      │
//!                 │                                                         │
//!                 │  config · lifecycle · observability · security          │
//!                 └───────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use relay_gateway::config::{self, ObservabilityConfig};
use relay_gateway::lifecycle::startup;
use relay_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "relay-gateway")]
#[command(about = "Serve front-end bundles and relay proxied traffic", long_about = None)]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);

    match startup::start(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
