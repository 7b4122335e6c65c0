//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod worker;

pub use job::{PollArgs, SubmitArgs};
pub use worker::WorkerCommands;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the backend is reachable
    Health,
    /// Submit an optimization job
    Submit(SubmitArgs),
    /// Watch a job until it finishes or the attempt budget runs out
    Watch {
        /// Job ID
        job_id: String,

        #[command(flatten)]
        poll: PollArgs,
    },
    /// Show a job's current record
    Job {
        /// Job ID
        job_id: String,
    },
    /// Worker-side operations (requires the worker token)
    Worker {
        #[command(subcommand)]
        command: WorkerCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Health => health(config).await,
        Commands::Submit(args) => job::submit(config, args).await,
        Commands::Watch { job_id, poll } => job::watch(config, job_id.into(), poll).await,
        Commands::Job { job_id } => job::get_job(config, job_id.into()).await,
        Commands::Worker { command } => worker::handle_worker_command(command, config).await,
    }
}

async fn health(config: &Config) -> Result<()> {
    config
        .client()
        .ping()
        .await
        .with_context(|| format!("Backend at {} is not healthy", config.api_url))?;

    println!("{} Backend at {} is up", "✓".green(), config.api_url);
    Ok(())
}

/// Resolves on Ctrl-C
///
/// If the signal handler cannot be installed this never resolves, so a
/// failed listener is not mistaken for an interrupt.
async fn interrupted() {
    wait_for_interrupt(tokio::signal::ctrl_c()).await
}

async fn wait_for_interrupt(signal: impl Future<Output = std::io::Result<()>>) {
    if let Err(e) = signal.await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
