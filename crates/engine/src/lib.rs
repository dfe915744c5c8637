// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! br-engine: Partitioning and parallel shard execution
//!
//! The engine splits a batch into contiguous shards, hands each shard to an
//! independent worker task, and coordinates the one-time session bootstrap
//! between the primary worker and the rest. Workers share nothing but the
//! published session artifact, the results sink, and the halt token.

pub mod agent;
pub mod bootstrap;
pub mod context;
pub mod executor;
pub mod partition;
pub mod pool;

pub use agent::{AgentError, AutomationAgent, ScriptedAgent, SessionArtifact, StepRequest};
#[cfg(any(test, feature = "test-support"))]
pub use agent::{FakeAgent, FakeOutcome};
pub use bootstrap::BootstrapError;
pub use context::{AgentFactory, ExecutionContext};
pub use executor::{ExecutorConfig, RunShared, ShardExecutor};
pub use partition::{partition, PartitionError, Shard, MAX_WORKERS};
pub use pool::{PoolConfig, PoolOutcome, WorkerPool};
