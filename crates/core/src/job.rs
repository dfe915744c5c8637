// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Server-side job record and state machine.
//!
//! A Job tracks one invocation of the full pipeline run by the job server
//! as a supervised child process. The child-process handle itself is not
//! part of the record; the server keeps it in its process table.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

crate::define_id! {
    /// Unique identifier for a submitted job.
    pub struct JobId("job-");
}

/// Capacity of the per-job log tail ring buffer.
pub const LOG_TAIL_LINES: usize = 50;

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    /// Active jobs hold the server's single-flight gate.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }
}

crate::simple_display! {
    JobStatus {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Server-side record of one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    pub dry_run: bool,
    pub workers: usize,
    /// Expected unit count, computed from the submitted payload alone.
    pub total_units: usize,
    /// Best-effort counter fed by output pattern-matching. Only the final
    /// TaskResult tally is authoritative.
    pub completed_units: usize,
    /// Produced identifiers observed in the output, deduplicated in order.
    pub produced_ids: Vec<String>,
    /// Ring buffer of the most recent output lines.
    pub log_lines: VecDeque<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at_ms: u64,
}

impl JobRecord {
    pub fn new(id: JobId, dry_run: bool, workers: usize, total_units: usize, epoch_ms: u64) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            dry_run,
            workers,
            total_units,
            completed_units: 0,
            produced_ids: Vec::new(),
            log_lines: VecDeque::new(),
            error: None,
            created_at_ms: epoch_ms,
        }
    }

    /// Append a line to the log tail, dropping the oldest beyond capacity.
    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.log_lines.len() == LOG_TAIL_LINES {
            self.log_lines.pop_front();
        }
        self.log_lines.push_back(line.into());
    }

    /// Record a produced identifier, deduplicating while preserving order,
    /// and bump the best-effort completion counter.
    pub fn record_produced(&mut self, id: &str) {
        if !self.produced_ids.iter().any(|p| p == id) {
            self.produced_ids.push(id.to_string());
            self.completed_units = self.produced_ids.len();
        }
    }

    pub fn log_tail(&self) -> Vec<String> {
        self.log_lines.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
