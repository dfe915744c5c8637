// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-subtask execution outcomes.

use crate::worker::WorkerId;
use serde::{Deserialize, Serialize};

/// Outcome status of one attempted (or deliberately skipped) subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// The step completed and produced its identifier.
    Success,
    /// The step completed but some of its side work did not (e.g. the
    /// campaign exists but the ad upload failed).
    Partial,
    /// The step was attempted and failed; siblings continue.
    Failed,
    /// Never attempted: unmet prerequisite or post-fault drain. Not an error.
    Skipped,
    /// The agent does not implement the requested workflow.
    NotImplemented,
}

impl TaskStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Success)
    }
}

crate::simple_display! {
    TaskStatus {
        Success => "success",
        Partial => "partial",
        Failed => "failed",
        Skipped => "skipped",
        NotImplemented => "not_implemented",
    }
}

/// Record of one subtask attempt.
///
/// Every attempted subtask yields at least one TaskResult — results are
/// never silently lost, though a crash-retry may duplicate one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub worker: WorkerId,
    /// WorkItem group this subtask belongs to.
    pub group: String,
    /// Subtask tag within the item.
    pub tag: String,
    pub status: TaskStatus,
    pub elapsed_ms: u64,
    /// Identifier produced by the step, consumed by dependent subtasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produced_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Epoch milliseconds when the result was recorded.
    pub recorded_at_ms: u64,
}

crate::builder! {
    pub struct TaskResultBuilder => TaskResult {
        into {
            group: String = "group-1",
            tag: String = "desktop",
        }
        set {
            worker: WorkerId = WorkerId::new(1),
            status: TaskStatus = TaskStatus::Success,
            elapsed_ms: u64 = 1_000,
            recorded_at_ms: u64 = 1_000_000,
        }
        option {
            produced_id: String = None,
            error: String = None,
        }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
