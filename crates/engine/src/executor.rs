// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequential shard executor.
//!
//! One executor runs one worker's shard, item by item, subtasks in declared
//! order. Failures stay local to the subtask; a context fault earns exactly
//! one rebuild-and-retry; every attempted subtask leaves a TaskResult in
//! the shared sink. After each WorkItem the item's recorded states are
//! merged into the shared batch and the checkpoint is saved.

use crate::agent::{AgentError, StepRequest};
use crate::context::ExecutionContext;
use crate::partition::Shard;
use br_core::batch::{Batch, SubtaskState, WorkItem};
use br_core::clock::Clock;
use br_core::result::{TaskResult, TaskStatus};
use br_storage::CheckpointStore;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Bound on a single `perform_step` call. A stuck step becomes a
    /// `failed` result, never a hang.
    pub step_timeout: Duration,
    pub dry_run: bool,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(30),
            dry_run: false,
        }
    }
}

/// State shared by every worker of one run.
///
/// Locks guard short synchronous sections only; they are never held across
/// an await.
pub struct RunShared {
    pub batch: Mutex<Batch>,
    pub results: Mutex<Vec<TaskResult>>,
    pub checkpoints: Option<CheckpointStore>,
}

impl RunShared {
    pub fn new(batch: Batch, checkpoints: Option<CheckpointStore>) -> Self {
        Self {
            batch: Mutex::new(batch),
            results: Mutex::new(Vec::new()),
            checkpoints,
        }
    }
}

enum StepOutcome {
    Produced(String),
    NotImplemented(String),
    Failed {
        message: String,
        /// True when the failure followed a context fault; the rest of the
        /// item drains as skipped.
        after_fault: bool,
    },
}

pub struct ShardExecutor<C: Clock> {
    ctx: ExecutionContext,
    config: ExecutorConfig,
    shared: Arc<RunShared>,
    halt: CancellationToken,
    clock: C,
}

impl<C: Clock> ShardExecutor<C> {
    pub fn new(
        ctx: ExecutionContext,
        config: ExecutorConfig,
        shared: Arc<RunShared>,
        halt: CancellationToken,
        clock: C,
    ) -> Self {
        Self { ctx, config, shared, halt, clock }
    }

    /// Run the shard to completion (or until halted).
    pub async fn run(mut self, shard: Shard) {
        let worker = self.ctx.worker();
        for mut item in shard.items {
            if self.halt.is_cancelled() {
                tracing::info!(worker = %worker, "halt observed, draining");
                break;
            }
            tracing::info!(worker = %worker, group = %item.group, "starting item");
            self.run_item(&mut item).await;
            self.commit(&item);
        }
    }

    async fn run_item(&mut self, item: &mut WorkItem) {
        let mut faulted = false;
        for index in 0..item.subtasks.len() {
            if self.halt.is_cancelled() {
                return;
            }

            let subtask = item.subtasks[index].clone();
            if subtask.state.is_done() {
                tracing::debug!(
                    group = %item.group,
                    tag = %subtask.tag,
                    "already completed in an earlier run"
                );
                continue;
            }

            if faulted {
                self.finish(
                    item,
                    index,
                    TaskStatus::Skipped,
                    0,
                    None,
                    Some("aborted: earlier subtask faulted the execution context".to_string()),
                );
                continue;
            }

            // Dependency gate: the prerequisite must have succeeded, in this
            // run or a checkpointed one.
            let prerequisite_id = match &subtask.requires {
                None => None,
                Some(required) => match item.subtask(required) {
                    Some(prereq) if prereq.state.is_done() => prereq.state.produced_id.clone(),
                    Some(_) => {
                        self.finish(item, index, TaskStatus::Skipped, 0, None, None);
                        continue;
                    }
                    None => {
                        self.finish(
                            item,
                            index,
                            TaskStatus::Skipped,
                            0,
                            None,
                            Some(format!("unknown prerequisite tag '{required}'")),
                        );
                        continue;
                    }
                },
            };

            let request = StepRequest {
                group: item.group.clone(),
                tag: subtask.tag.clone(),
                workflow: subtask.workflow.clone(),
                params: subtask.params.clone(),
                prerequisite_id,
                dry_run: self.config.dry_run,
            };

            let started = self.clock.now();
            let outcome = self.attempt_with_retry(&request).await;
            let elapsed_ms = self.clock.now().duration_since(started).as_millis() as u64;

            match outcome {
                StepOutcome::Produced(id) => {
                    tracing::info!(
                        group = %item.group,
                        tag = %subtask.tag,
                        id = %id,
                        elapsed_ms,
                        "subtask succeeded"
                    );
                    self.finish(item, index, TaskStatus::Success, elapsed_ms, Some(id), None);
                }
                StepOutcome::NotImplemented(workflow) => {
                    self.finish(
                        item,
                        index,
                        TaskStatus::NotImplemented,
                        elapsed_ms,
                        None,
                        Some(format!("workflow not implemented: {workflow}")),
                    );
                }
                StepOutcome::Failed { message, after_fault } => {
                    tracing::error!(
                        group = %item.group,
                        tag = %subtask.tag,
                        error = %message,
                        "subtask failed"
                    );
                    self.finish(item, index, TaskStatus::Failed, elapsed_ms, None, Some(message));
                    faulted = after_fault;
                }
            }
        }
    }

    /// One attempt, plus a single rebuild-and-retry on a context fault.
    async fn attempt_with_retry(&mut self, request: &StepRequest) -> StepOutcome {
        match self.attempt(request).await {
            Ok(id) => StepOutcome::Produced(id),
            Err(AgentError::NotImplemented(workflow)) => StepOutcome::NotImplemented(workflow),
            Err(AgentError::Fault(message)) => {
                tracing::warn!(
                    group = %request.group,
                    tag = %request.tag,
                    error = %message,
                    "execution context fault, rebuilding and retrying"
                );
                if let Err(e) = self.ctx.rebuild().await {
                    return StepOutcome::Failed {
                        message: format!("context rebuild failed: {e}"),
                        after_fault: true,
                    };
                }
                match self.attempt(request).await {
                    Ok(id) => StepOutcome::Produced(id),
                    Err(AgentError::NotImplemented(workflow)) => {
                        StepOutcome::NotImplemented(workflow)
                    }
                    Err(e) => StepOutcome::Failed {
                        message: format!("retry after context fault failed: {e}"),
                        after_fault: true,
                    },
                }
            }
            Err(e) => StepOutcome::Failed {
                message: e.to_string(),
                after_fault: false,
            },
        }
    }

    async fn attempt(&self, request: &StepRequest) -> Result<String, AgentError> {
        match tokio::time::timeout(
            self.config.step_timeout,
            self.ctx.agent().perform_step(request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(AgentError::Step(format!(
                "timed out after {}ms",
                self.config.step_timeout.as_millis()
            ))),
        }
    }

    /// Record the subtask's state on the item and push its TaskResult.
    fn finish(
        &self,
        item: &mut WorkItem,
        index: usize,
        status: TaskStatus,
        elapsed_ms: u64,
        produced_id: Option<String>,
        error: Option<String>,
    ) {
        item.subtasks[index].state = SubtaskState {
            result: Some(status),
            produced_id: produced_id.clone(),
        };
        let result = TaskResult {
            worker: self.ctx.worker(),
            group: item.group.clone(),
            tag: item.subtasks[index].tag.clone(),
            status,
            elapsed_ms,
            produced_id,
            error,
            recorded_at_ms: self.clock.epoch_ms(),
        };
        self.shared.results.lock().push(result);
    }

    /// Merge the item's recorded states into the shared batch and save the
    /// checkpoint. Save failures are warnings, never fatal.
    fn commit(&self, item: &WorkItem) {
        let batch = &mut *self.shared.batch.lock();
        if let Some(target) = batch.item_mut(&item.group) {
            for subtask in &item.subtasks {
                if let Some(t) = target.subtask_mut(&subtask.tag) {
                    t.state = subtask.state.clone();
                }
            }
        }
        if let Some(store) = &self.shared.checkpoints {
            if let Err(e) = store.save(batch) {
                tracing::warn!(group = %item.group, error = %e, "checkpoint save failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
