// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpoint resume specs
//!
//! A run checkpoints after every completed item; a resumed run replays
//! recorded successes and attempts only what is left.

use crate::prelude::*;

#[tokio::test]
async fn failed_subtask_is_retried_on_resume_and_completed_work_is_not() {
    let state = TempDir::new().unwrap();
    let store = CheckpointStore::new(state.path());

    // First run: "beta" fails, "alpha" completes and is checkpointed.
    let agent = Arc::new(FakeAgent::new());
    agent.on("beta", "desktop", FakeOutcome::Fail("flaked".into()));
    let pool = WorkerPool::new(fast_config(&state, 1), shared_factory(&agent), SystemClock)
        .with_checkpoints(store.clone());

    let batch = Batch::new(
        "campaigns.csv",
        vec![campaign("alpha", &["desktop"]), campaign("beta", &["desktop"])],
    );
    let session_id = batch.session_id.clone();
    pool.run(batch).await.unwrap();

    let record = store.load(&session_id).unwrap().unwrap();
    assert_eq!(record.completed_subtasks(), 1);

    // Resume: a fresh load of the same input, replayed from the snapshot.
    let mut resumed = Batch::new(
        "campaigns.csv",
        vec![campaign("alpha", &["desktop"]), campaign("beta", &["desktop"])],
    );
    assert_eq!(store.restore(&mut resumed, &record), 1);
    assert_eq!(resumed.session_id, session_id);

    let retry_agent = Arc::new(FakeAgent::new());
    let pool = WorkerPool::new(fast_config(&state, 1), shared_factory(&retry_agent), SystemClock)
        .with_checkpoints(store.clone());
    let outcome = pool.run(resumed).await.unwrap();

    // Only the failed campaign is attempted again.
    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].group, "beta");
    assert_eq!(outcome.results[0].status, TaskStatus::Success);
    assert_eq!(retry_agent.attempts("alpha", "desktop"), 0);

    let record = store.load(&session_id).unwrap().unwrap();
    assert_eq!(record.completed_subtasks(), 2);
}

#[tokio::test]
async fn restored_ios_id_still_feeds_a_retried_android() {
    let state = TempDir::new().unwrap();
    let store = CheckpointStore::new(state.path());

    let agent = Arc::new(FakeAgent::new());
    agent.on("promo", "android", FakeOutcome::Fail("flaked".into()));
    let pool = WorkerPool::new(fast_config(&state, 1), shared_factory(&agent), SystemClock)
        .with_checkpoints(store.clone());

    let batch = Batch::new("campaigns.csv", vec![campaign("promo", &["ios", "android"])]);
    let session_id = batch.session_id.clone();
    pool.run(batch).await.unwrap();

    let record = store.load(&session_id).unwrap().unwrap();
    let ios_id = record.items[0]
        .subtask("ios")
        .and_then(|s| s.state.produced_id.clone())
        .unwrap();

    let mut resumed = Batch::new("campaigns.csv", vec![campaign("promo", &["ios", "android"])]);
    store.restore(&mut resumed, &record);

    let retry_agent = Arc::new(FakeAgent::new());
    let pool = WorkerPool::new(fast_config(&state, 1), shared_factory(&retry_agent), SystemClock)
        .with_checkpoints(store.clone());
    let outcome = pool.run(resumed).await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].tag, "android");
    assert_eq!(outcome.results[0].status, TaskStatus::Success);
    assert_eq!(retry_agent.attempts("promo", "ios"), 0);
    let request = retry_agent.last_request("promo", "android").unwrap();
    assert_eq!(request.prerequisite_id.as_deref(), Some(ios_id.as_str()));
}
