// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parallel execution specs
//!
//! Drive a whole batch through the worker pool and check the merged
//! results and the aggregated report.

use crate::prelude::*;

#[tokio::test]
async fn four_campaigns_across_two_workers_all_succeed() {
    let dir = TempDir::new().unwrap();
    let agent = Arc::new(FakeAgent::new());
    let pool = WorkerPool::new(fast_config(&dir, 2), shared_factory(&agent), SystemClock);

    let items = (1..=4).map(|i| campaign(&format!("c{i}"), &["desktop"])).collect();
    let outcome = pool.run(Batch::new("campaigns.csv", items)).await.unwrap();

    let report = RunReport::from_results(&outcome.results, outcome.wall_time);
    assert_eq!(report.total_results, 4);
    assert_eq!(report.total_workitems, 4);
    assert_eq!(report.success, 4);
    assert_eq!(report.produced_ids.len(), 4);
    assert!(!report.all_failed());
}

#[tokio::test]
async fn android_consumes_the_ios_campaign_id() {
    let dir = TempDir::new().unwrap();
    let agent = Arc::new(FakeAgent::new());
    let pool = WorkerPool::new(fast_config(&dir, 1), shared_factory(&agent), SystemClock);

    let batch = Batch::new("campaigns.csv", vec![campaign("promo", &["ios", "android"])]);
    let outcome = pool.run(batch).await.unwrap();

    assert!(outcome.results.iter().all(|r| r.status == TaskStatus::Success));
    let ios_id = outcome
        .results
        .iter()
        .find(|r| r.tag == "ios")
        .and_then(|r| r.produced_id.clone())
        .unwrap();
    let request = agent.last_request("promo", "android").unwrap();
    assert_eq!(request.prerequisite_id.as_deref(), Some(ios_id.as_str()));
}

#[tokio::test]
async fn failed_ios_skips_android_but_not_desktop() {
    let dir = TempDir::new().unwrap();
    let agent = Arc::new(FakeAgent::new());
    agent.on("promo", "ios", FakeOutcome::Fail("quota exceeded".into()));
    let pool = WorkerPool::new(fast_config(&dir, 1), shared_factory(&agent), SystemClock);

    let batch = Batch::new(
        "campaigns.csv",
        vec![campaign("promo", &["desktop", "ios", "android"])],
    );
    let outcome = pool.run(batch).await.unwrap();

    let status = |tag: &str| {
        outcome
            .results
            .iter()
            .find(|r| r.tag == tag)
            .map(|r| r.status)
            .unwrap()
    };
    assert_eq!(status("desktop"), TaskStatus::Success);
    assert_eq!(status("ios"), TaskStatus::Failed);
    assert_eq!(status("android"), TaskStatus::Skipped);
    assert_eq!(agent.attempts("promo", "android"), 0);

    let report = RunReport::from_results(&outcome.results, outcome.wall_time);
    assert_eq!((report.success, report.failed, report.skipped), (1, 1, 1));
    assert!(!report.all_failed());
}

#[tokio::test]
async fn disabled_campaigns_are_never_attempted() {
    let dir = TempDir::new().unwrap();
    let agent = Arc::new(FakeAgent::new());
    let pool = WorkerPool::new(fast_config(&dir, 2), shared_factory(&agent), SystemClock);

    let mut paused = campaign("paused", &["desktop"]);
    paused.enabled = false;
    let batch = Batch::new("campaigns.csv", vec![campaign("live", &["desktop"]), paused]);
    let outcome = pool.run(batch).await.unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].group, "live");
    assert_eq!(agent.attempts("paused", "desktop"), 0);
}

#[tokio::test]
async fn every_shard_reports_even_when_everything_fails() {
    let dir = TempDir::new().unwrap();
    let agent = Arc::new(FakeAgent::new());
    for group in ["a", "b"] {
        agent.on(group, "desktop", FakeOutcome::Fail("down".into()));
    }
    let pool = WorkerPool::new(fast_config(&dir, 2), shared_factory(&agent), SystemClock);

    let batch = Batch::new(
        "campaigns.csv",
        vec![campaign("a", &["desktop"]), campaign("b", &["desktop"])],
    );
    let outcome = pool.run(batch).await.unwrap();

    let report = RunReport::from_results(&outcome.results, outcome.wall_time);
    assert_eq!(report.total_results, 2);
    assert_eq!(report.failed, 2);
    assert!(report.all_failed());
    assert!(report.produced_ids.is_empty());
}
