// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Automation agent seam.
//!
//! An [`AutomationAgent`] drives the external system a workflow step runs
//! against. The engine never knows what is behind the trait: the built-in
//! [`ScriptedAgent`] fabricates results for dry runs, and real drivers plug
//! in at the same seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The agent's execution context died mid-run. Recoverable by one
    /// context rebuild; the in-flight subtask is retried.
    #[error("execution context fault: {0}")]
    Fault(String),
    /// The step itself failed. Local to the subtask.
    #[error("step failed: {0}")]
    Step(String),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("workflow not implemented: {0}")]
    NotImplemented(String),
}

/// Opaque session credentials produced by the primary worker's
/// authentication and adopted by every other worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionArtifact {
    pub payload: serde_json::Value,
    pub issued_at_ms: u64,
}

/// One workflow step, fully specified up front.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRequest {
    pub group: String,
    pub tag: String,
    pub workflow: String,
    #[serde(default)]
    pub params: serde_json::Value,
    /// Identifier produced by the prerequisite subtask, when one is named.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prerequisite_id: Option<String>,
    pub dry_run: bool,
}

/// Driver for one worker's exclusive automation session.
#[async_trait]
pub trait AutomationAgent: Send + Sync {
    /// Interactive login. Performed once per run, by the primary worker only.
    async fn authenticate(&self) -> Result<SessionArtifact, AgentError>;

    /// Adopt a session artifact published by the primary worker.
    async fn adopt_session(&self, artifact: &SessionArtifact) -> Result<(), AgentError>;

    /// Run one workflow step and return the identifier it produced.
    async fn perform_step(&self, request: &StepRequest) -> Result<String, AgentError>;

    /// Cheap liveness probe for the current session.
    async fn is_session_valid(&self) -> bool;
}

/// Deterministic built-in driver used for dry runs and as the default CLI
/// driver. Fabricates sequential numeric identifiers and logs each step.
pub struct ScriptedAgent {
    next_id: AtomicU64,
    step_delay: std::time::Duration,
}

/// First identifier handed out by a [`ScriptedAgent`].
const SCRIPTED_ID_BASE: u64 = 1_013_017_400;

impl ScriptedAgent {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(SCRIPTED_ID_BASE),
            step_delay: std::time::Duration::ZERO,
        }
    }

    /// Simulate per-step latency, so parallelism is visible in timings.
    pub fn with_step_delay(mut self, delay: std::time::Duration) -> Self {
        self.step_delay = delay;
        self
    }
}

impl Default for ScriptedAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AutomationAgent for ScriptedAgent {
    async fn authenticate(&self) -> Result<SessionArtifact, AgentError> {
        Ok(SessionArtifact {
            payload: serde_json::json!({ "driver": "scripted" }),
            issued_at_ms: 0,
        })
    }

    async fn adopt_session(&self, _artifact: &SessionArtifact) -> Result<(), AgentError> {
        Ok(())
    }

    async fn perform_step(&self, request: &StepRequest) -> Result<String, AgentError> {
        if request.workflow != "create_campaign" {
            return Err(AgentError::NotImplemented(request.workflow.clone()));
        }
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            group = %request.group,
            tag = %request.tag,
            dry_run = request.dry_run,
            id,
            "scripted step"
        );
        Ok(id.to_string())
    }

    async fn is_session_valid(&self) -> bool {
        true
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeAgent, FakeOutcome};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, VecDeque};

    /// Programmable outcome for one `perform_step` call.
    #[derive(Debug, Clone)]
    pub enum FakeOutcome {
        Succeed,
        Fail(String),
        Fault(String),
        NotImplemented,
        /// Never completes; exercises the executor's step timeout.
        Hang,
    }

    /// Scriptable agent for tests: queue outcomes per (group, tag), every
    /// call beyond the queue succeeds.
    pub struct FakeAgent {
        next_id: AtomicU64,
        auth_error: Mutex<Option<String>>,
        auth_delay: Mutex<std::time::Duration>,
        scripts: Mutex<HashMap<(String, String), VecDeque<FakeOutcome>>>,
        attempts: Mutex<HashMap<(String, String), usize>>,
        requests: Mutex<Vec<StepRequest>>,
        adopted: Mutex<Vec<SessionArtifact>>,
    }

    impl FakeAgent {
        pub fn new() -> Self {
            Self {
                next_id: AtomicU64::new(9_000),
                auth_error: Mutex::new(None),
                auth_delay: Mutex::new(std::time::Duration::ZERO),
                scripts: Mutex::new(HashMap::new()),
                attempts: Mutex::new(HashMap::new()),
                requests: Mutex::new(Vec::new()),
                adopted: Mutex::new(Vec::new()),
            }
        }

        /// Queue an outcome for the next call against (group, tag).
        pub fn on(&self, group: &str, tag: &str, outcome: FakeOutcome) {
            self.scripts
                .lock()
                .entry((group.to_string(), tag.to_string()))
                .or_default()
                .push_back(outcome);
        }

        pub fn fail_auth(&self, message: &str) {
            *self.auth_error.lock() = Some(message.to_string());
        }

        /// Delay `authenticate`, to exercise bootstrap waits.
        pub fn set_auth_delay(&self, delay: std::time::Duration) {
            *self.auth_delay.lock() = delay;
        }

        /// Number of `perform_step` calls seen for (group, tag).
        pub fn attempts(&self, group: &str, tag: &str) -> usize {
            self.attempts
                .lock()
                .get(&(group.to_string(), tag.to_string()))
                .copied()
                .unwrap_or(0)
        }

        /// Artifacts adopted so far (one per context build or rebuild).
        pub fn adoptions(&self) -> usize {
            self.adopted.lock().len()
        }

        /// Every StepRequest seen, in call order.
        pub fn requests(&self) -> Vec<StepRequest> {
            self.requests.lock().clone()
        }

        /// The most recent StepRequest for (group, tag).
        pub fn last_request(&self, group: &str, tag: &str) -> Option<StepRequest> {
            self.requests
                .lock()
                .iter()
                .rev()
                .find(|r| r.group == group && r.tag == tag)
                .cloned()
        }
    }

    impl Default for FakeAgent {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AutomationAgent for FakeAgent {
        async fn authenticate(&self) -> Result<SessionArtifact, AgentError> {
            let delay = *self.auth_delay.lock();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Some(message) = self.auth_error.lock().clone() {
                return Err(AgentError::Auth(message));
            }
            Ok(SessionArtifact {
                payload: serde_json::json!({ "driver": "fake" }),
                issued_at_ms: 1_000_000,
            })
        }

        async fn adopt_session(&self, artifact: &SessionArtifact) -> Result<(), AgentError> {
            self.adopted.lock().push(artifact.clone());
            Ok(())
        }

        async fn perform_step(&self, request: &StepRequest) -> Result<String, AgentError> {
            let key = (request.group.clone(), request.tag.clone());
            *self.attempts.lock().entry(key.clone()).or_insert(0) += 1;
            self.requests.lock().push(request.clone());

            let outcome = self
                .scripts
                .lock()
                .get_mut(&key)
                .and_then(|queue| queue.pop_front())
                .unwrap_or(FakeOutcome::Succeed);

            match outcome {
                FakeOutcome::Succeed => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    Ok(id.to_string())
                }
                FakeOutcome::Fail(message) => Err(AgentError::Step(message)),
                FakeOutcome::Fault(message) => Err(AgentError::Fault(message)),
                FakeOutcome::NotImplemented => {
                    Err(AgentError::NotImplemented(request.workflow.clone()))
                }
                FakeOutcome::Hang => loop {
                    std::future::pending::<()>().await;
                },
            }
        }

        async fn is_session_valid(&self) -> bool {
            true
        }
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
