//! Job command handlers
//!
//! Submission, lookup and watching. A submission is sent exactly once;
//! watching only ever reads.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use veriopt_client::{JobPoller, OptimizerClient, PollOutcome, PollPolicy, PollUpdate};
use veriopt_core::domain::job::{Job, JobId, JobState};
use veriopt_core::domain::result::PartialResult;
use veriopt_core::domain::spec::{OptimizationSpec, TargetOptions};

use crate::config::Config;

/// Poll budget shared by `submit --watch` and `watch`
#[derive(Args, Debug, Clone, Copy)]
pub struct PollArgs {
    /// Maximum number of status checks
    #[arg(long, env = "POLL_ATTEMPTS", default_value_t = 120)]
    pub attempts: u32,

    /// Delay between status checks, in milliseconds
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 1000)]
    pub interval_ms: u64,
}

impl PollArgs {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            max_attempts: self.attempts,
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// RTL source file to optimize
    pub file: PathBuf,

    /// Top module name
    #[arg(long)]
    pub top: Option<String>,

    /// Do not optimize for power
    #[arg(long)]
    pub no_power: bool,

    /// Do not optimize for timing
    #[arg(long)]
    pub no_timing: bool,

    /// Also optimize for area
    #[arg(long)]
    pub area: bool,

    /// Maximum optimization iterations
    #[arg(long)]
    pub max_iters: Option<u32>,

    /// Maximum candidates evaluated per iteration
    #[arg(long)]
    pub max_parallel: Option<u32>,

    /// Keep watching the job after submitting it
    #[arg(long)]
    pub watch: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

impl SubmitArgs {
    fn to_spec(&self, source: String) -> OptimizationSpec {
        let mut spec = OptimizationSpec::new(source).with_options(TargetOptions {
            power: !self.no_power,
            timing: !self.no_timing,
            area: self.area,
        });
        spec.budgets.max_iters = self.max_iters;
        spec.budgets.max_parallel = self.max_parallel;
        spec.top_module = self.top.clone();
        spec
    }
}

/// Submit a source file, optionally watching the new job
pub async fn submit(config: &Config, args: SubmitArgs) -> Result<()> {
    let source = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let spec = args.to_spec(source);

    spec.validate().map_err(anyhow::Error::msg)?;

    let client = config.client();
    let job_id = client.start_optimization(&spec).await?;

    println!("{} Job submitted: {}", "✓".green(), job_id.to_string().cyan());

    if args.watch {
        println!();
        watch_job(client, job_id, args.poll).await?;
    } else {
        println!("  Watch it with: {}", format!("veriopt watch {}", job_id).dimmed());
    }

    Ok(())
}

/// Watch an existing job
pub async fn watch(config: &Config, job_id: JobId, poll: PollArgs) -> Result<()> {
    watch_job(config.client(), job_id, poll).await
}

/// Get and display a single job
pub async fn get_job(config: &Config, job_id: JobId) -> Result<()> {
    let job = config.client().get_job(&job_id).await?;

    print_job_details(&job);

    Ok(())
}

async fn watch_job(client: OptimizerClient, job_id: JobId, poll: PollArgs) -> Result<()> {
    let handle = JobPoller::new(Arc::new(client))
        .with_policy(poll.policy())
        .spawn(job_id.clone());
    let mut updates = handle.updates();
    let mut progress = Progress::default();

    println!(
        "{}",
        format!("Watching job {} (Ctrl-C to stop)...", job_id).dimmed()
    );

    let interrupt = super::interrupted();
    tokio::pin!(interrupt);
    let mut stopping = false;

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let latest = updates.borrow_and_update().clone();
                if let Some(update) = latest {
                    progress.report(&update);
                }
            }
            _ = &mut interrupt, if !stopping => {
                stopping = true;
                handle.cancel();
            }
        }
    }

    let outcome = handle.join().await.context("Poll task failed")?;

    match outcome {
        PollOutcome::Finished { job, attempts } => {
            println!();
            println!(
                "{}",
                format!("Job finished after {} check(s).", attempts).bold()
            );
            print_job_details(&job);
        }
        PollOutcome::Pending {
            attempts,
            last_seen,
        } => {
            let state = last_seen
                .as_ref()
                .map(|job| job.state.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "{}",
                format!(
                    "Job {} still {} after {} check(s); it may finish later.",
                    job_id, state, attempts
                )
                .yellow()
            );
            println!("  Resume with: {}", format!("veriopt watch {}", job_id).dimmed());
        }
        PollOutcome::Cancelled { attempts } => {
            println!(
                "{}",
                format!("Stopped watching job {} after {} check(s).", job_id, attempts).dimmed()
            );
        }
    }

    Ok(())
}

/// Prints a line only when something visible changed
#[derive(Default)]
struct Progress {
    last: Option<(JobState, Option<u32>, bool)>,
}

impl Progress {
    fn report(&mut self, update: &PollUpdate) {
        let has_metrics = update
            .partial
            .as_ref()
            .is_some_and(|partial| partial.metrics.is_some());
        let key = (update.job.state, update.job.iteration, has_metrics);
        if self.last == Some(key) {
            return;
        }
        self.last = Some(key);

        let mut line = format!("  [{}] {}", update.attempt, colorize_state(update.job.state));
        if let Some(iteration) = update.job.iteration {
            line.push_str(&format!("  iteration {}", iteration));
        }
        if let Some(metrics) = update.partial.as_ref().and_then(|p| p.metrics.as_ref()) {
            line.push_str(&format!("  {}", metrics.to_string().dimmed()));
        }
        println!("{}", line);
    }
}

/// Print detailed job information
fn print_job_details(job: &Job) {
    println!("{}", "Job Details:".bold());
    println!("  ID:          {}", job.job_id.to_string().cyan());
    println!("  State:       {}", colorize_state(job.state));
    println!(
        "  Created:     {}",
        job.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        job.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(iteration) = job.iteration {
        println!("  Iteration:   {}", iteration);
    }

    if let Some(logs_tail) = &job.logs_tail {
        println!("  Last log:    {}", logs_tail.dimmed());
    }

    let Some(result) = &job.result else {
        return;
    };
    let partial = PartialResult::from_result(result);

    if let Some(metrics) = &partial.metrics {
        println!("\n{}", "Metrics:".bold());
        if let Some(map) = metrics.as_object() {
            for (key, value) in map {
                println!("  {} = {}", key.cyan(), value);
            }
        }
    }

    if let Some(artifact) = &partial.artifact {
        println!("\n{}", "Optimized source:".bold());
        println!("{}", artifact);
    }
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> ColoredString {
    let text = state.as_str();
    match state {
        JobState::Queued => text.yellow(),
        JobState::Running => text.cyan(),
        JobState::Completed => text.green(),
        JobState::Failed => text.red(),
    }
}
