// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Child-process supervision for one job.
//!
//! The pipeline runs as a child process; the supervisor streams its stdout
//! and stderr line by line into the job's log ring and scrapes progress out
//! of the text. Cancellation kills the child; whatever the pipeline already
//! created externally stays created.

use crate::routes::ServerConfig;
use crate::store::JobStore;
use br_core::job::{JobId, JobRecord, JobStatus};
use regex::Regex;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::LazyLock;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Produced identifier in pipeline output, e.g. `  ID: 1013017411`.
#[allow(clippy::expect_used)]
static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)ID:\s*(\d+)").expect("constant regex pattern is valid")
});

/// Authoritative enabled-campaign count announced by the pipeline.
#[allow(clippy::expect_used)]
static TOTAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Found\s+(\d+)\s+enabled\s+campaign").expect("constant regex pattern is valid")
});

/// Fold one output line into the job record: log ring, produced ids, and
/// the announced total.
pub fn apply_output_line(record: &mut JobRecord, line: &str) {
    record.push_log(line);
    if let Some(captures) = ID_PATTERN.captures(line) {
        record.record_produced(&captures[1]);
    }
    if let Some(total) = TOTAL_PATTERN
        .captures(line)
        .and_then(|c| c[1].parse::<usize>().ok())
    {
        record.total_units = total;
    }
}

fn build_command(config: &ServerConfig, input_path: &Path, workers: usize, dry_run: bool) -> Command {
    let mut command = Command::new(&config.pipeline_bin);
    command
        .arg("run")
        .arg("--input")
        .arg(input_path)
        .arg("--workers")
        .arg(workers.to_string())
        .env("BR_STATE_DIR", &config.state_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if dry_run {
        command.arg("--dry-run");
    }
    command
}

/// Run the pipeline child to completion (or cancellation), feeding its
/// output into the store as it arrives.
pub async fn supervise(
    store: Arc<dyn JobStore>,
    config: Arc<ServerConfig>,
    job_id: JobId,
    input_path: std::path::PathBuf,
    workers: usize,
    dry_run: bool,
    cancel: CancellationToken,
) {
    store.update(&job_id, &mut |job| job.status = JobStatus::Running);

    let mut child = match build_command(&config, &input_path, workers, dry_run).spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::error!(job = %job_id, error = %e, "failed to spawn pipeline");
            store.update(&job_id, &mut |job| {
                job.status = JobStatus::Failed;
                job.error = Some(format!("failed to spawn pipeline: {e}"));
            });
            return;
        }
    };
    tracing::info!(job = %job_id, pipeline = %config.pipeline_bin.display(), "pipeline started");

    let mut stdout = child.stdout.take().map(|s| BufReader::new(s).lines());
    let mut stderr = child.stderr.take().map(|s| BufReader::new(s).lines());

    let mut cancelled = false;
    loop {
        tokio::select! {
            line = next_line(&mut stdout), if stdout.is_some() => match line {
                Some(line) => ingest(&store, &job_id, &line),
                None => stdout = None,
            },
            line = next_line(&mut stderr), if stderr.is_some() => match line {
                Some(line) => ingest(&store, &job_id, &line),
                None => stderr = None,
            },
            _ = cancel.cancelled(), if !cancelled => {
                tracing::warn!(job = %job_id, "cancelling: killing pipeline child");
                if let Err(e) = child.kill().await {
                    tracing::error!(job = %job_id, error = %e, "failed to kill pipeline");
                }
                cancelled = true;
            },
            else => break,
        }
        if stdout.is_none() && stderr.is_none() {
            break;
        }
    }

    let status = child.wait().await;
    store.update(&job_id, &mut |job| {
        if cancelled {
            job.status = JobStatus::Cancelled;
            job.push_log("job cancelled; campaigns already created remain live");
            return;
        }
        match &status {
            Ok(status) if status.success() => {
                job.status = JobStatus::Completed;
            }
            Ok(status) => {
                job.status = JobStatus::Failed;
                job.error = Some(format!("pipeline exited with {status}"));
            }
            Err(e) => {
                job.status = JobStatus::Failed;
                job.error = Some(format!("pipeline wait failed: {e}"));
            }
        }
    });
    tracing::info!(job = %job_id, cancelled, "pipeline finished");
}

async fn next_line<R>(lines: &mut Option<tokio::io::Lines<BufReader<R>>>) -> Option<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await.ok().flatten(),
        None => None,
    }
}

fn ingest(store: &Arc<dyn JobStore>, job_id: &JobId, line: &str) {
    tracing::debug!(job = %job_id, line, "pipeline output");
    store.update(job_id, &mut |job| apply_output_line(job, line));
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
