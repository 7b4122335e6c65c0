//! Veriopt CLI
//!
//! Command-line interface for submitting RTL optimization jobs, watching
//! them, and running a demo worker against the backend.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "veriopt")]
#[command(about = "RTL optimizer job CLI", long_about = None)]
struct Cli {
    /// Backend URL
    #[arg(long, env = "VERIOPT_API_URL", default_value = "http://127.0.0.1:8000")]
    api_url: String,

    /// Shared worker secret for the claim and finish endpoints
    #[arg(long, env = "WORKER_TOKEN", hide_env_values = true)]
    worker_token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
        worker_token: cli.worker_token,
    };

    handle_command(cli.command, &config).await
}
