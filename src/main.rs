//! Edge Gateway
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────────┐
//!                    │                      EDGE GATEWAY                        │
//!                    │                                                          │
//!  Client Request    │  ┌────────┐   ┌─────────┐   ┌──────────────────────────┐ │
//!  ──────────────────┼─▶│  http  │──▶│ routing │──▶│        pipeline          │ │
//!                    │  │ server │   │ (prefix)│   │ log → auth → ssrf screen │ │
//!                    │  └────────┘   └─────────┘   └────────────┬─────────────┘ │
//!                    │       ▲                       terminate  │  continue     │
//!  Client Response   │       │ 401 / 403 ◀──────────────────────┤               │
//!  ◀─────────────────┼───────┘                                  ▼               │
//!                    │                               forward + X-User-* ────────┼──▶ Backend
//!                    │                                                          │
//!                    │  ┌────────┐ ┌───────────────┐ ┌───────┐ ┌──────────────┐ │
//!                    │  │ config │ │ observability │ │ admin │ │  lifecycle   │ │
//!                    │  └────────┘ └───────────────┘ └───────┘ └──────────────┘ │
//!                    └──────────────────────────────────────────────────────────┘
//!
//!  Backend ──▶ fetch (bounded outbound validator) ──▶ caller-supplied URL
//! ```

use clap::Parser;
use std::path::PathBuf;

use edge_gateway::config::loader::load_config;
use edge_gateway::lifecycle::startup;

#[derive(Parser)]
#[command(name = "edge-gateway", version, about = "Authenticating, SSRF-screening edge gateway")]
struct Args {
    /// Path to the TOML config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate the config file and exit
    #[arg(long, requires = "config")]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.check {
        if let Some(path) = &args.config {
            load_config(path)?;
            println!("{}: ok", path.display());
        }
        return Ok(());
    }

    startup::run(args.config).await?;
    Ok(())
}
