// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run command: load a campaign CSV and execute it across the worker pool.
//!
//! Summary lines on stdout are part of the tool's contract: the job server
//! scrapes "Found N enabled campaigns" and "  ID: <id>" lines from this
//! output to track progress. Diagnostics go to stderr via tracing.

use crate::env;
use crate::exit_error::ExitError;
use crate::load;
use anyhow::Result;
use br_core::batch::SessionId;
use br_core::clock::SystemClock;
use br_core::report::RunReport;
use br_core::time_fmt::format_elapsed_ms;
use br_engine::{AgentFactory, AutomationAgent, PoolConfig, ScriptedAgent, WorkerPool};
use br_storage::CheckpointStore;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args)]
pub struct RunArgs {
    /// Campaign CSV to execute
    #[arg(long)]
    pub input: PathBuf,

    /// Number of parallel workers
    #[arg(long, default_value_t = 2)]
    pub workers: usize,

    /// Walk every step without creating anything
    #[arg(long)]
    pub dry_run: bool,

    /// Resume a previous session from its checkpoint
    #[arg(long, value_name = "SESSION_ID")]
    pub resume: Option<String>,

    /// Override the session artifact path
    #[arg(long, value_name = "PATH")]
    pub session_file: Option<PathBuf>,
}

pub async fn handle(args: RunArgs) -> Result<()> {
    let state_dir = env::state_dir()?;
    let store = CheckpointStore::new(&state_dir);

    let mut batch = load::load_batch(&args.input)?;

    if let Some(session) = &args.resume {
        let session_id = SessionId::from_string(session.as_str());
        let record = store.load(&session_id)?.ok_or_else(|| {
            ExitError::new(1, format!("no checkpoint found for session '{session}'"))
        })?;
        let restored = store.restore(&mut batch, &record);
        println!("Resuming session {session}: {restored} subtasks already complete");
    }

    println!("Found {} enabled campaigns", batch.enabled_count());
    if batch.disabled_count() > 0 {
        println!("Skipping {} disabled campaigns", batch.disabled_count());
    }

    let session_file = args
        .session_file
        .unwrap_or_else(|| state_dir.join("session.json"));
    let config = PoolConfig::new(args.workers, session_file).dry_run(args.dry_run);
    let factory: AgentFactory =
        Arc::new(|| Arc::new(ScriptedAgent::new()) as Arc<dyn AutomationAgent>);
    let pool = WorkerPool::new(config, factory, SystemClock).with_checkpoints(store);

    let halt = pool.halt_token();
    let interrupt = halt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, draining workers");
            interrupt.cancel();
        }
    });

    let session_id = batch.session_id.clone();
    let outcome = pool
        .run(batch)
        .await
        .map_err(|e| ExitError::new(1, e.to_string()))?;

    let report = RunReport::from_results(&outcome.results, outcome.wall_time);
    print_report(&report);

    if halt.is_cancelled() {
        println!("Interrupted. Resume with: br run --input {} --resume {session_id}",
            args.input.display());
        return Err(ExitError::silent(130).into());
    }
    if report.total_results > 0 && report.all_failed() {
        return Err(ExitError::new(1, "no campaign was created").into());
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!();
    println!("Run summary");
    println!(
        "  {} results over {} campaigns: {} succeeded, {} partial, {} failed, {} skipped",
        report.total_results,
        report.total_workitems,
        report.success,
        report.partial,
        report.failed,
        report.skipped,
    );
    if report.not_implemented > 0 {
        println!("  {} steps hit unimplemented workflows", report.not_implemented);
    }
    for id in &report.produced_ids {
        println!("  ID: {id}");
    }
    println!("  Wall time: {}", format_elapsed_ms(report.wall_ms));
    println!(
        "  Sequential estimate: {}",
        format_elapsed_ms(report.sequential_estimate_ms())
    );
    println!("  Speedup: {:.2}x", report.speedup);
    for (worker, busy) in &report.worker_busy_ms {
        println!("    {worker}: busy {}", format_elapsed_ms(*busy));
    }
}
