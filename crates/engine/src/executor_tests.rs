// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::{AutomationAgent, FakeAgent, FakeOutcome, SessionArtifact};
use crate::context::AgentFactory;
use async_trait::async_trait;
use br_core::batch::Subtask;
use br_core::clock::FakeClock;
use br_core::worker::WorkerId;
use tempfile::TempDir;

fn artifact() -> SessionArtifact {
    SessionArtifact {
        payload: serde_json::json!({ "driver": "fake" }),
        issued_at_ms: 1_000_000,
    }
}

/// desktop + ios, with android depending on the ios campaign id.
fn mobile_item(group: &str) -> WorkItem {
    WorkItem::builder()
        .group(group)
        .subtasks(vec![
            Subtask::new("desktop", "create_campaign"),
            Subtask::new("ios", "create_campaign"),
            Subtask::new("android", "create_campaign").requires("ios"),
        ])
        .build()
}

async fn run_shard(
    agent: Arc<FakeAgent>,
    items: Vec<WorkItem>,
    config: ExecutorConfig,
    checkpoints: Option<CheckpointStore>,
    halt: CancellationToken,
) -> Arc<RunShared> {
    let batch = Batch::new("campaigns.csv", items.clone());
    let shared = Arc::new(RunShared::new(batch, checkpoints));
    let for_factory = agent.clone();
    let factory: AgentFactory = Arc::new(move || for_factory.clone());
    let ctx =
        ExecutionContext::from_authenticated(WorkerId::new(1), factory, agent, artifact());
    let executor =
        ShardExecutor::new(ctx, config, shared.clone(), halt, FakeClock::new());
    executor
        .run(Shard { worker: WorkerId::new(1), items })
        .await;
    shared
}

fn statuses(shared: &RunShared) -> Vec<(String, TaskStatus)> {
    shared
        .results
        .lock()
        .iter()
        .map(|r| (r.tag.clone(), r.status))
        .collect()
}

#[tokio::test]
async fn dependent_subtask_receives_prerequisite_id() {
    let agent = Arc::new(FakeAgent::new());
    let shared = run_shard(
        agent.clone(),
        vec![mobile_item("a")],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    let results = shared.results.lock().clone();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.status == TaskStatus::Success));

    let ios_id = results
        .iter()
        .find(|r| r.tag == "ios")
        .and_then(|r| r.produced_id.clone())
        .unwrap();
    let android_request = agent.last_request("a", "android").unwrap();
    assert_eq!(android_request.prerequisite_id.as_deref(), Some(ios_id.as_str()));
}

#[tokio::test]
async fn failed_prerequisite_skips_dependent_without_attempting_it() {
    let agent = Arc::new(FakeAgent::new());
    agent.on("a", "ios", FakeOutcome::Fail("upload rejected".into()));

    let shared = run_shard(
        agent.clone(),
        vec![mobile_item("a")],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    assert_eq!(
        statuses(&shared),
        vec![
            ("desktop".to_string(), TaskStatus::Success),
            ("ios".to_string(), TaskStatus::Failed),
            ("android".to_string(), TaskStatus::Skipped),
        ]
    );
    assert_eq!(agent.attempts("a", "android"), 0);
    // A dependency skip is not an error.
    let results = shared.results.lock().clone();
    let android = results.iter().find(|r| r.tag == "android").unwrap();
    assert!(android.error.is_none());
}

#[tokio::test]
async fn unknown_prerequisite_tag_skips_with_diagnostic() {
    let agent = Arc::new(FakeAgent::new());
    let item = WorkItem::builder()
        .group("a")
        .subtasks(vec![
            Subtask::new("android", "create_campaign").requires("windows-phone"),
        ])
        .build();

    let shared = run_shard(
        agent,
        vec![item],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    let results = shared.results.lock().clone();
    assert_eq!(results[0].status, TaskStatus::Skipped);
    assert!(results[0].error.as_deref().unwrap().contains("windows-phone"));
}

#[tokio::test]
async fn fault_rebuilds_context_and_retries_once() {
    let agent = Arc::new(FakeAgent::new());
    agent.on("a", "desktop", FakeOutcome::Fault("browser died".into()));

    let shared = run_shard(
        agent.clone(),
        vec![mobile_item("a")],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    let results = shared.results.lock().clone();
    assert!(results.iter().all(|r| r.status == TaskStatus::Success));
    assert_eq!(agent.attempts("a", "desktop"), 2);
    // One rebuild means one fresh adoption.
    assert_eq!(agent.adoptions(), 1);
}

#[tokio::test]
async fn failed_retry_drains_the_rest_of_the_item() {
    let agent = Arc::new(FakeAgent::new());
    agent.on("a", "desktop", FakeOutcome::Fault("browser died".into()));
    agent.on("a", "desktop", FakeOutcome::Fault("still dead".into()));

    let shared = run_shard(
        agent.clone(),
        vec![mobile_item("a"), mobile_item("b")],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    let results = shared.results.lock().clone();
    let item_a: Vec<_> = results.iter().filter(|r| r.group == "a").collect();
    assert_eq!(item_a[0].status, TaskStatus::Failed);
    assert_eq!(item_a[1].status, TaskStatus::Skipped);
    assert_eq!(item_a[2].status, TaskStatus::Skipped);
    assert!(item_a[1].error.as_deref().unwrap().contains("faulted"));
    assert_eq!(agent.attempts("a", "ios"), 0);

    // The fault stays local to its item; the next item runs normally.
    let item_b: Vec<_> = results.iter().filter(|r| r.group == "b").collect();
    assert_eq!(item_b.len(), 3);
    assert!(item_b.iter().all(|r| r.status == TaskStatus::Success));
}

#[tokio::test]
async fn hung_step_times_out_as_failed() {
    let agent = Arc::new(FakeAgent::new());
    agent.on("a", "desktop", FakeOutcome::Hang);

    let config = ExecutorConfig {
        step_timeout: Duration::from_millis(20),
        dry_run: false,
    };
    let shared = run_shard(
        agent,
        vec![mobile_item("a")],
        config,
        None,
        CancellationToken::new(),
    )
    .await;

    let results = shared.results.lock().clone();
    let desktop = results.iter().find(|r| r.tag == "desktop").unwrap();
    assert_eq!(desktop.status, TaskStatus::Failed);
    assert!(desktop.error.as_deref().unwrap().contains("timed out"));
    // Siblings without a dependency on it still run.
    let ios = results.iter().find(|r| r.tag == "ios").unwrap();
    assert_eq!(ios.status, TaskStatus::Success);
}

#[tokio::test]
async fn restored_subtasks_are_not_reattempted_but_satisfy_dependents() {
    let agent = Arc::new(FakeAgent::new());
    let mut item = mobile_item("a");
    item.subtask_mut("ios").unwrap().state = SubtaskState {
        result: Some(TaskStatus::Success),
        produced_id: Some("1013017411".to_string()),
    };

    let shared = run_shard(
        agent.clone(),
        vec![item],
        ExecutorConfig::default(),
        None,
        CancellationToken::new(),
    )
    .await;

    // No fresh result for the restored subtask.
    let results = shared.results.lock().clone();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.tag != "ios"));
    assert_eq!(agent.attempts("a", "ios"), 0);

    let android_request = agent.last_request("a", "android").unwrap();
    assert_eq!(android_request.prerequisite_id.as_deref(), Some("1013017411"));
}

#[tokio::test]
async fn pre_halted_run_records_nothing() {
    let agent = Arc::new(FakeAgent::new());
    let halt = CancellationToken::new();
    halt.cancel();

    let shared = run_shard(
        agent.clone(),
        vec![mobile_item("a")],
        ExecutorConfig::default(),
        None,
        halt,
    )
    .await;

    assert!(shared.results.lock().is_empty());
    assert_eq!(agent.attempts("a", "desktop"), 0);
}

/// Agent that charges step time to the injected clock instead of waiting.
struct MeteredAgent {
    clock: FakeClock,
    step_cost: Duration,
}

#[async_trait]
impl AutomationAgent for MeteredAgent {
    async fn authenticate(&self) -> Result<SessionArtifact, AgentError> {
        Ok(artifact())
    }

    async fn adopt_session(&self, _artifact: &SessionArtifact) -> Result<(), AgentError> {
        Ok(())
    }

    async fn perform_step(&self, _request: &StepRequest) -> Result<String, AgentError> {
        self.clock.advance(self.step_cost);
        Ok("1013017411".to_string())
    }

    async fn is_session_valid(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn elapsed_ms_is_measured_on_the_injected_clock() {
    let clock = FakeClock::new();
    let agent: Arc<dyn AutomationAgent> = Arc::new(MeteredAgent {
        clock: clock.clone(),
        step_cost: Duration::from_millis(1_500),
    });
    let item = WorkItem::builder()
        .group("a")
        .subtasks(vec![Subtask::new("desktop", "create_campaign")])
        .build();
    let batch = Batch::new("campaigns.csv", vec![item.clone()]);
    let shared = Arc::new(RunShared::new(batch, None));
    let for_factory = agent.clone();
    let factory: AgentFactory = Arc::new(move || for_factory.clone());
    let ctx =
        ExecutionContext::from_authenticated(WorkerId::new(1), factory, agent, artifact());
    let executor = ShardExecutor::new(
        ctx,
        ExecutorConfig::default(),
        shared.clone(),
        CancellationToken::new(),
        clock,
    );
    executor
        .run(Shard { worker: WorkerId::new(1), items: vec![item] })
        .await;

    let results = shared.results.lock().clone();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].elapsed_ms, 1_500);
}

#[tokio::test]
async fn checkpoint_is_saved_after_each_item() {
    let dir = TempDir::new().unwrap();
    let store = CheckpointStore::new(dir.path());
    let agent = Arc::new(FakeAgent::new());
    agent.on("a", "ios", FakeOutcome::Fail("upload rejected".into()));

    let shared = run_shard(
        agent,
        vec![mobile_item("a")],
        ExecutorConfig::default(),
        Some(store.clone()),
        CancellationToken::new(),
    )
    .await;

    let session_id = shared.batch.lock().session_id.clone();
    let record = store.load(&session_id).unwrap().unwrap();
    let saved = record.items.iter().find(|i| i.group == "a").unwrap();
    assert!(saved.subtask("desktop").unwrap().state.is_done());
    assert_eq!(
        saved.subtask("ios").unwrap().state.result,
        Some(TaskStatus::Failed)
    );
    assert!(!saved.subtask("android").unwrap().state.is_done());
}
