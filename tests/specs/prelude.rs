// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for workspace specs.

pub use br_core::batch::{Batch, Subtask, WorkItem};
pub use br_core::clock::SystemClock;
pub use br_core::report::RunReport;
pub use br_core::result::TaskStatus;
pub use br_engine::{AgentFactory, FakeAgent, FakeOutcome, PoolConfig, WorkerPool};
pub use br_storage::CheckpointStore;
pub use std::sync::Arc;
pub use std::time::Duration;
pub use tempfile::TempDir;

/// A WorkItem with one `create_campaign` subtask per variant tag;
/// `android` depends on `ios`, as the loader wires it.
pub fn campaign(group: &str, variants: &[&str]) -> WorkItem {
    let subtasks = variants
        .iter()
        .map(|&tag| {
            let subtask = Subtask::new(tag, "create_campaign");
            if tag == "android" {
                subtask.requires("ios")
            } else {
                subtask
            }
        })
        .collect();
    WorkItem::new(group, subtasks)
}

/// Pool config with test-friendly timings.
pub fn fast_config(dir: &TempDir, workers: usize) -> PoolConfig {
    PoolConfig::new(workers, dir.path().join("session.json"))
        .bootstrap_poll_interval(Duration::from_millis(5))
        .bootstrap_max_attempts(400)
        .step_timeout(Duration::from_secs(5))
        .launch_stagger(Duration::ZERO)
}

/// Factory handing every worker the same scripted agent.
pub fn shared_factory(agent: &Arc<FakeAgent>) -> AgentFactory {
    let agent = agent.clone();
    Arc::new(move || agent.clone())
}
