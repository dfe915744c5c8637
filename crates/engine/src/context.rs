// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker execution context.
//!
//! Wraps one worker's exclusive agent handle together with the session
//! artifact it adopted, so a mid-run fault can tear the agent down and
//! rebuild it without touching any other worker.

use crate::agent::{AgentError, AutomationAgent, SessionArtifact};
use br_core::worker::WorkerId;
use std::sync::Arc;

/// Creates fresh agent instances; called once per context build or rebuild.
pub type AgentFactory = Arc<dyn Fn() -> Arc<dyn AutomationAgent> + Send + Sync>;

pub struct ExecutionContext {
    worker: WorkerId,
    factory: AgentFactory,
    agent: Arc<dyn AutomationAgent>,
    artifact: SessionArtifact,
    rebuilds: u32,
}

impl ExecutionContext {
    /// Build a context for a non-primary worker by adopting a published
    /// session artifact.
    pub async fn adopt(
        worker: WorkerId,
        factory: AgentFactory,
        artifact: SessionArtifact,
    ) -> Result<Self, AgentError> {
        let agent = factory();
        agent.adopt_session(&artifact).await?;
        Ok(Self { worker, factory, agent, artifact, rebuilds: 0 })
    }

    /// Build a context around the primary worker's already-authenticated
    /// agent; no adoption round-trip needed.
    pub fn from_authenticated(
        worker: WorkerId,
        factory: AgentFactory,
        agent: Arc<dyn AutomationAgent>,
        artifact: SessionArtifact,
    ) -> Self {
        Self { worker, factory, agent, artifact, rebuilds: 0 }
    }

    pub fn agent(&self) -> &dyn AutomationAgent {
        self.agent.as_ref()
    }

    pub fn worker(&self) -> WorkerId {
        self.worker
    }

    pub fn rebuilds(&self) -> u32 {
        self.rebuilds
    }

    /// Tear down the agent and re-create it from the factory, re-adopting
    /// the original session artifact.
    pub async fn rebuild(&mut self) -> Result<(), AgentError> {
        self.rebuilds += 1;
        tracing::warn!(worker = %self.worker, rebuilds = self.rebuilds, "rebuilding execution context");
        let agent = (self.factory)();
        agent.adopt_session(&self.artifact).await?;
        self.agent = agent;
        Ok(())
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
