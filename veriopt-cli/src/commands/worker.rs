//! Worker command handlers
//!
//! `claim` takes one job off the queue. `simulate` runs a demo worker that
//! claims queued jobs and reports canned progress and results through the
//! same callback and finish endpoints a real optimization engine uses.

use std::time::Duration;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use serde_json::{Value, json};
use veriopt_client::OptimizerClient;
use veriopt_core::domain::job::{Job, JobId, JobState};
use veriopt_core::domain::result::{COMPLETION_ARTIFACT_KEY, METRICS_KEY};
use veriopt_core::dto::job::{FinishJob, JobUpdate};

use crate::config::Config;

const POWER_SAVINGS_PCT: f64 = 32.0;
const TIMING_IMPROVEMENT_PCT: f64 = 15.0;

/// Worker subcommands
#[derive(Subcommand)]
pub enum WorkerCommands {
    /// Claim the oldest queued job and print it
    Claim,
    /// Run a demo worker that completes queued jobs with sample results
    Simulate {
        /// Progress updates posted per job before finishing it
        #[arg(long, default_value_t = 3)]
        iterations: u32,

        /// Delay between progress updates, in milliseconds
        #[arg(long, default_value_t = 500)]
        step_ms: u64,

        /// Delay before checking an empty queue again, in milliseconds
        #[arg(long, default_value_t = 2000)]
        idle_ms: u64,

        /// Exit once the queue is empty instead of waiting for more jobs
        #[arg(long)]
        once: bool,
    },
}

/// Handle worker commands
pub async fn handle_worker_command(command: WorkerCommands, config: &Config) -> Result<()> {
    let client = config.worker_client()?;

    match command {
        WorkerCommands::Claim => claim(&client).await,
        WorkerCommands::Simulate {
            iterations,
            step_ms,
            idle_ms,
            once,
        } => {
            let pacing = Pacing {
                step: Duration::from_millis(step_ms),
                idle: Duration::from_millis(idle_ms),
            };
            tokio::select! {
                result = simulate(&client, iterations, pacing, once) => result,
                _ = super::interrupted() => {
                    println!("{}", "Worker stopped.".dimmed());
                    Ok(())
                }
            }
        }
    }
}

async fn claim(client: &OptimizerClient) -> Result<()> {
    match client.claim_next_job().await? {
        Some(job) => {
            println!("{} Claimed job {}", "✓".green(), job.job_id.to_string().cyan());
            match serde_json::to_string_pretty(&job) {
                Ok(pretty) => println!("{}", pretty),
                Err(_) => println!("{:?}", job),
            }
        }
        None => println!("{}", "No queued jobs.".yellow()),
    }

    Ok(())
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    step: Duration,
    idle: Duration,
}

async fn simulate(client: &OptimizerClient, iterations: u32, pacing: Pacing, once: bool) -> Result<()> {
    println!("{}", "Demo worker started.".bold());

    loop {
        let Some(job) = client.claim_next_job().await? else {
            if once {
                println!("{}", "Queue empty, exiting.".dimmed());
                return Ok(());
            }
            tokio::time::sleep(pacing.idle).await;
            continue;
        };

        println!("  {} Job {}", "▸".cyan(), job.job_id.to_string().bold());

        if let Err(e) = process_job(client, &job, iterations, pacing.step).await {
            tracing::error!("Job {} failed: {:#}", job.job_id, e);
            println!("    {} {}", "✗".red(), e);

            let failure = JobUpdate::for_job(job.job_id.clone())
                .with_state(JobState::Failed)
                .with_logs_tail(truncate(&e.to_string(), 300));
            if let Err(e) = client.post_update(&failure).await {
                tracing::warn!("Could not report failure for job {}: {}", job.job_id, e);
            }
        }
    }
}

async fn process_job(client: &OptimizerClient, job: &Job, iterations: u32, step: Duration) -> Result<()> {
    client.post_update(&baseline_update(job)).await?;
    println!("    baseline measured");

    for iteration in 1..=iterations {
        tokio::time::sleep(step).await;
        client
            .post_update(&iteration_update(&job.job_id, iteration))
            .await?;
        println!("    iteration {} reported", iteration);
    }

    client
        .finish_job(&FinishJob {
            job_id: job.job_id.clone(),
            status: JobState::Completed,
            result: Some(final_result(job)),
        })
        .await?;
    println!("    {} completed", "✓".green());

    Ok(())
}

fn metrics(power_savings_pct: f64, timing_improvement_pct: f64) -> Value {
    json!({
        "power_savings_pct": power_savings_pct,
        "timing_improvement_pct": timing_improvement_pct,
    })
}

/// First report: the unmodified design with zero improvement
fn baseline_update(job: &Job) -> JobUpdate {
    JobUpdate::for_job(job.job_id.clone())
        .with_state(JobState::Running)
        .with_iteration(0)
        .with_result(json!({ METRICS_KEY: metrics(0.0, 0.0) }))
        .with_metadata("optimized_verilog", Value::String(job.spec.source.clone()))
        .with_metadata(
            "insights",
            json!([{"title": "Baseline measured", "detail": "Initial synthesis, simulation and timing complete."}]),
        )
        .with_logs_tail("baseline measured")
}

fn iteration_update(job_id: &JobId, iteration: u32) -> JobUpdate {
    JobUpdate::for_job(job_id.clone())
        .with_iteration(iteration)
        .with_result(json!({ METRICS_KEY: metrics(POWER_SAVINGS_PCT, TIMING_IMPROVEMENT_PCT) }))
        .with_metadata(
            "insights",
            json!([{"title": "Candidate accepted", "detail": format!("Iteration {} improved the design", iteration)}]),
        )
        .with_logs_tail("iteration improved")
}

/// Final result: the design passed through with the sample metrics
fn final_result(job: &Job) -> Value {
    let source = format!("// optimized by the veriopt demo worker\n{}", job.spec.source);
    json!({
        COMPLETION_ARTIFACT_KEY: source,
        METRICS_KEY: metrics(POWER_SAVINGS_PCT, TIMING_IMPROVEMENT_PCT),
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriopt_core::domain::result::{PartialResult, has_completion_artifact};
    use veriopt_core::domain::spec::OptimizationSpec;

    fn job() -> Job {
        let mut job = Job::queued(OptimizationSpec::new("module top(); endmodule"));
        job.state = JobState::Running;
        job
    }

    #[test]
    fn test_baseline_update_marks_running_without_artifact() {
        let job = job();
        let update = baseline_update(&job);

        assert_eq!(update.correlation_key(), Some(&job.job_id));
        assert_eq!(update.state, Some(JobState::Running));
        assert_eq!(update.iteration, Some(0));
        assert!(!has_completion_artifact(update.result.as_ref().unwrap()));
        assert_eq!(
            update.metadata["optimized_verilog"],
            "module top(); endmodule"
        );
    }

    #[test]
    fn test_iteration_update_reports_sample_metrics() {
        let update = iteration_update(&JobId::from("job-1"), 2);
        let partial = PartialResult::from_result(update.result.as_ref().unwrap());

        assert_eq!(update.state, None);
        assert_eq!(update.iteration, Some(2));
        assert_eq!(partial.metrics.unwrap()["power_savings_pct"], 32.0);
    }

    #[test]
    fn test_final_result_carries_completion_artifact() {
        let result = final_result(&job());

        assert!(has_completion_artifact(&result));
        assert!(
            result["optimized_source"]
                .as_str()
                .unwrap()
                .ends_with("module top(); endmodule")
        );
        assert_eq!(result["metrics"]["timing_improvement_pct"], 15.0);
    }

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("ééé", 2), "éé");
        assert_eq!(truncate("short", 300), "short");
    }
}
