// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: one tokio task per shard, with one-time session bootstrap.
//!
//! The primary worker (first by assignment order) authenticates and
//! publishes the session artifact; the rest poll for it. Workers share only
//! the read-only artifact, the results sink, and the halt token. A worker
//! that cannot bootstrap fails its own shard; only a primary authentication
//! failure (or a partitioning error) takes the whole run down.

use crate::agent::AutomationAgent;
use crate::bootstrap;
use crate::context::{AgentFactory, ExecutionContext};
use crate::executor::{ExecutorConfig, RunShared, ShardExecutor};
use crate::partition::{partition, PartitionError, Shard};
use br_core::batch::Batch;
use br_core::clock::Clock;
use br_core::result::{TaskResult, TaskStatus};
use br_storage::CheckpointStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    /// Where the primary publishes the session artifact.
    pub session_file: PathBuf,
    pub bootstrap_poll_interval: Duration,
    pub bootstrap_max_attempts: u32,
    pub step_timeout: Duration,
    /// Delay between successive worker launches, so logins do not pile up.
    pub launch_stagger: Duration,
    pub dry_run: bool,
}

impl PoolConfig {
    pub fn new(workers: usize, session_file: impl Into<PathBuf>) -> Self {
        Self {
            workers,
            session_file: session_file.into(),
            bootstrap_poll_interval: Duration::from_secs(2),
            bootstrap_max_attempts: 100,
            step_timeout: Duration::from_secs(30),
            launch_stagger: Duration::from_secs(2),
            dry_run: false,
        }
    }

    br_core::setters! {
        into {
            session_file: PathBuf,
        }
        set {
            workers: usize,
            bootstrap_poll_interval: Duration,
            bootstrap_max_attempts: u32,
            step_timeout: Duration,
            launch_stagger: Duration,
            dry_run: bool,
        }
    }
}

/// Merged outcome of one run.
#[derive(Debug)]
pub struct PoolOutcome {
    pub results: Vec<TaskResult>,
    pub wall_time: Duration,
}

pub struct WorkerPool<C: Clock + 'static> {
    config: PoolConfig,
    factory: AgentFactory,
    checkpoints: Option<CheckpointStore>,
    clock: C,
    halt: CancellationToken,
}

impl<C: Clock + 'static> WorkerPool<C> {
    pub fn new(config: PoolConfig, factory: AgentFactory, clock: C) -> Self {
        Self {
            config,
            factory,
            checkpoints: None,
            clock,
            halt: CancellationToken::new(),
        }
    }

    /// Enable checkpoint saves after every completed WorkItem.
    pub fn with_checkpoints(mut self, store: CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    /// Token that drains all workers when cancelled (e.g. on Ctrl-C).
    pub fn halt_token(&self) -> CancellationToken {
        self.halt.clone()
    }

    /// Partition the batch, run every shard to completion, and merge the
    /// results. Worker task panics become `failed` results for the shard;
    /// the tally is never silently short.
    pub async fn run(&self, batch: Batch) -> Result<PoolOutcome, PartitionError> {
        let shards = partition(&batch, self.config.workers)?;
        if shards.is_empty() {
            tracing::info!("nothing to do");
            return Ok(PoolOutcome {
                results: Vec::new(),
                wall_time: Duration::ZERO,
            });
        }

        if let Err(e) = bootstrap::clear(&self.config.session_file) {
            tracing::warn!(error = %e, "could not remove stale session artifact");
        }

        let started = self.clock.now();
        let shared = Arc::new(RunShared::new(batch, self.checkpoints.clone()));

        let mut handles = Vec::with_capacity(shards.len());
        for (index, shard) in shards.into_iter().enumerate() {
            let delay = self.config.launch_stagger * index as u32;
            let task = worker_task(
                shard.clone(),
                delay,
                self.config.clone(),
                self.factory.clone(),
                shared.clone(),
                self.halt.clone(),
                self.clock.clone(),
            );
            handles.push((shard, tokio::spawn(task)));
        }

        for (shard, handle) in handles {
            if let Err(join_err) = handle.await {
                tracing::error!(worker = %shard.worker, error = %join_err, "worker task panicked");
                fail_shard(
                    &shared,
                    &shard,
                    &format!("worker task panicked: {join_err}"),
                    &self.clock,
                );
            }
        }

        let wall_time = self.clock.now().duration_since(started);
        let results = std::mem::take(&mut *shared.results.lock());
        tracing::info!(
            results = results.len(),
            wall_ms = wall_time.as_millis() as u64,
            "run complete"
        );
        Ok(PoolOutcome { results, wall_time })
    }
}

async fn worker_task<C: Clock + 'static>(
    shard: Shard,
    delay: Duration,
    config: PoolConfig,
    factory: AgentFactory,
    shared: Arc<RunShared>,
    halt: CancellationToken,
    clock: C,
) {
    let worker = shard.worker;
    if halt.is_cancelled() {
        tracing::info!(worker = %worker, "halted before start, draining");
        return;
    }
    tracing::info!(worker = %worker, items = shard.items.len(), "worker starting");

    if !delay.is_zero() {
        tokio::select! {
            _ = halt.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let ctx = if worker.is_primary() {
        match bootstrap_primary(&shard, &config, &factory, &shared, &halt, &clock).await {
            Some(ctx) => ctx,
            None => return,
        }
    } else {
        match bootstrap_follower(&shard, &config, &factory, &shared, &halt, &clock).await {
            Some(ctx) => ctx,
            None => return,
        }
    };

    tracing::info!(worker = %worker, "authenticated, executing shard");
    let executor_config = ExecutorConfig {
        step_timeout: config.step_timeout,
        dry_run: config.dry_run,
    };
    ShardExecutor::new(ctx, executor_config, shared, halt, clock)
        .run(shard)
        .await;
    tracing::info!(worker = %worker, "worker done");
}

/// Interactive login plus artifact publication. On failure the halt token
/// is cancelled so followers fail fast instead of polling out their budget.
async fn bootstrap_primary<C: Clock>(
    shard: &Shard,
    config: &PoolConfig,
    factory: &AgentFactory,
    shared: &RunShared,
    halt: &CancellationToken,
    clock: &C,
) -> Option<ExecutionContext> {
    let worker = shard.worker;
    tracing::info!(worker = %worker, "authenticating");
    let agent: Arc<dyn AutomationAgent> = factory();

    let artifact = match agent.authenticate().await {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!(worker = %worker, error = %e, "primary authentication failed");
            halt.cancel();
            fail_shard(shared, shard, &format!("authentication failed: {e}"), clock);
            return None;
        }
    };

    if let Err(e) = bootstrap::publish(&config.session_file, &artifact) {
        tracing::error!(worker = %worker, error = %e, "could not publish session artifact");
        halt.cancel();
        fail_shard(shared, shard, &format!("session publication failed: {e}"), clock);
        return None;
    }

    Some(ExecutionContext::from_authenticated(
        worker,
        factory.clone(),
        agent,
        artifact,
    ))
}

/// Poll for the published artifact and adopt it. A timeout fails only this
/// shard; the rest of the pool keeps going.
async fn bootstrap_follower<C: Clock>(
    shard: &Shard,
    config: &PoolConfig,
    factory: &AgentFactory,
    shared: &RunShared,
    halt: &CancellationToken,
    clock: &C,
) -> Option<ExecutionContext> {
    let worker = shard.worker;
    tracing::info!(worker = %worker, "awaiting session bootstrap");

    let artifact = match bootstrap::await_artifact(
        &config.session_file,
        config.bootstrap_poll_interval,
        config.bootstrap_max_attempts,
        halt,
    )
    .await
    {
        Ok(artifact) => artifact,
        Err(e) => {
            tracing::error!(worker = %worker, error = %e, "session bootstrap failed");
            fail_shard(shared, shard, &format!("session bootstrap failed: {e}"), clock);
            return None;
        }
    };

    match ExecutionContext::adopt(worker, factory.clone(), artifact).await {
        Ok(ctx) => Some(ctx),
        Err(e) => {
            tracing::error!(worker = %worker, error = %e, "session adoption failed");
            fail_shard(shared, shard, &format!("session adoption failed: {e}"), clock);
            None
        }
    }
}

/// Record a `failed` TaskResult for every unfinished subtask of the shard.
fn fail_shard<C: Clock>(shared: &RunShared, shard: &Shard, message: &str, clock: &C) {
    let mut results = shared.results.lock();
    for item in &shard.items {
        for subtask in &item.subtasks {
            if subtask.state.is_done() {
                continue;
            }
            results.push(TaskResult {
                worker: shard.worker,
                group: item.group.clone(),
                tag: subtask.tag.clone(),
                status: TaskStatus::Failed,
                elapsed_ms: 0,
                produced_id: None,
                error: Some(message.to_string()),
                recorded_at_ms: clock.epoch_ms(),
            });
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
