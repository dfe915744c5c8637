// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure aggregation of merged TaskResults into a run report.

use crate::result::{TaskResult, TaskStatus};
use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final tally over the merged results of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub total_results: usize,
    /// Distinct WorkItem groups that appear in the results.
    pub total_workitems: usize,
    pub success: usize,
    pub partial: usize,
    pub failed: usize,
    pub skipped: usize,
    pub not_implemented: usize,
    /// Distinct produced identifiers, in first-seen order.
    pub produced_ids: Vec<String>,
    /// Elapsed milliseconds per WorkItem group, in first-seen order.
    pub item_elapsed_ms: Vec<(String, u64)>,
    /// Busy milliseconds per worker.
    pub worker_busy_ms: Vec<(WorkerId, u64)>,
    pub wall_ms: u64,
    /// Realized speedup: sum of per-worker busy time over wall-clock time.
    pub speedup: f64,
}

impl RunReport {
    /// Aggregate a merged result list. Speedup falls back to 1.0 when the
    /// wall time rounds to zero milliseconds.
    pub fn from_results(results: &[TaskResult], wall: Duration) -> Self {
        let mut report = RunReport { total_results: results.len(), ..Default::default() };
        report.wall_ms = wall.as_millis() as u64;

        let mut groups: Vec<&str> = Vec::new();
        let mut workers: Vec<(WorkerId, u64)> = Vec::new();

        for result in results {
            match result.status {
                TaskStatus::Success => report.success += 1,
                TaskStatus::Partial => report.partial += 1,
                TaskStatus::Failed => report.failed += 1,
                TaskStatus::Skipped => report.skipped += 1,
                TaskStatus::NotImplemented => report.not_implemented += 1,
            }

            if let Some(id) = &result.produced_id {
                if !report.produced_ids.iter().any(|p| p == id) {
                    report.produced_ids.push(id.clone());
                }
            }

            if !groups.contains(&result.group.as_str()) {
                groups.push(&result.group);
            }
            match report.item_elapsed_ms.iter_mut().find(|(g, _)| g == &result.group) {
                Some((_, ms)) => *ms += result.elapsed_ms,
                None => report.item_elapsed_ms.push((result.group.clone(), result.elapsed_ms)),
            }

            match workers.iter_mut().find(|(w, _)| *w == result.worker) {
                Some((_, ms)) => *ms += result.elapsed_ms,
                None => workers.push((result.worker, result.elapsed_ms)),
            }
        }

        workers.sort_by_key(|(w, _)| *w);
        report.total_workitems = groups.len();
        report.worker_busy_ms = workers;

        let busy_total: u64 = report.worker_busy_ms.iter().map(|(_, ms)| ms).sum();
        report.speedup = if report.wall_ms > 0 {
            busy_total as f64 / report.wall_ms as f64
        } else {
            1.0
        };

        report
    }

    /// Estimated sequential duration: total busy time across workers.
    pub fn sequential_estimate_ms(&self) -> u64 {
        self.worker_busy_ms.iter().map(|(_, ms)| ms).sum()
    }

    /// True when no subtask succeeded (used for the process exit code).
    pub fn all_failed(&self) -> bool {
        self.success == 0 && self.partial == 0
    }
}

#[cfg(test)]
#[path = "report_tests.rs"]
mod tests;
