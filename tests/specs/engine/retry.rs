// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry and backoff specs
//!
//! Transient failures re-run the same operation after a capped exponential
//! backoff; the retry bound turns persistent flakiness into Failure.

use crate::prelude::*;

fn flaky(transients: usize) -> Arc<dyn Operation> {
    let mut op = ScriptedOp::new("flaky");
    for i in 0..transients {
        op = op.then(OpStep::Transient {
            error: format!("attempt {i} timed out"),
        });
    }
    Arc::new(op)
}

fn file_registry(dir: &tempfile::TempDir, clock: FakeClock) -> Registry<FileStore, FakeClock> {
    Registry::new(FileStore::open(dir.path()).unwrap(), clock, &spec_config())
}

#[tokio::test]
async fn two_transients_then_success() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry.submit(chain(vec![flaky(2)]), 0).unwrap();

    drain(&registry, &clock).await;

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Success);
    assert_eq!(job.retry_count, 2);
    assert_eq!(
        job.state_sequence(),
        vec![
            JobState::Pending,
            JobState::Running,
            JobState::Retry,
            JobState::Running,
            JobState::Retry,
            JobState::Running,
            JobState::Success,
        ]
    );
}

#[tokio::test]
async fn mid_chain_transients_hold_cursor_and_earlier_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());

    let shaky = ScriptedOp::new("shaky")
        .then(OpStep::Transient {
            error: "peer busy".to_string(),
        })
        .then(OpStep::Transient {
            error: "peer busy".to_string(),
        });
    let id = registry
        .submit(
            chain(vec![
                Arc::new(ScriptedOp::new("fetch").final_output(json!("blob"))) as Arc<dyn Operation>,
                Arc::new(shaky),
                scripted("publish"),
            ]),
            5,
        )
        .unwrap();

    // First operation completes, then the second fails transiently
    Scheduler::step_once(&registry).await;
    Scheduler::step_once(&registry).await;
    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Retry);
    // The cursor holds at the failing operation across the backoff
    assert_eq!(job.cursor, 1);
    assert_eq!(job.outputs[0], Some(json!("blob")));

    drain(&registry, &clock).await;

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Success);
    assert_eq!(job.retry_count, 2);
    assert_eq!(job.priority, 5);
    assert_eq!(job.cursor, 3);
    assert_eq!(job.outputs[0], Some(json!("blob")));
    assert_eq!(
        job.state_sequence(),
        vec![
            JobState::Pending,
            JobState::Running,
            JobState::Retry,
            JobState::Running,
            JobState::Retry,
            JobState::Running,
            JobState::Success,
        ]
    );
}

#[tokio::test]
async fn backoff_doubles_per_retry_and_gates_eligibility() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry.submit(chain(vec![flaky(3)]), 0).unwrap();

    // First failure: 100ms base doubled once
    Scheduler::step_once(&registry).await;
    let job = registry.get(&id).unwrap();
    assert_eq!(job.next_eligible_ms, Some(clock.epoch_ms() + 200));

    // Not yet eligible
    clock.advance(Duration::from_millis(199));
    assert!(!Scheduler::step_once(&registry).await);

    // Second failure: delay doubles
    clock.advance(Duration::from_millis(1));
    Scheduler::step_once(&registry).await;
    let job = registry.get(&id).unwrap();
    assert_eq!(job.retry_count, 2);
    assert_eq!(job.next_eligible_ms, Some(clock.epoch_ms() + 400));

    // Third failure: doubles again
    clock.advance(Duration::from_millis(400));
    Scheduler::step_once(&registry).await;
    let job = registry.get(&id).unwrap();
    assert_eq!(job.retry_count, 3);
    assert_eq!(job.next_eligible_ms, Some(clock.epoch_ms() + 800));

    // Script exhausted: the next attempt succeeds
    clock.advance(Duration::from_millis(800));
    Scheduler::step_once(&registry).await;
    assert_eq!(registry.get(&id).unwrap().state, JobState::Success);
}

#[tokio::test]
async fn persistent_flakiness_exhausts_retries_into_failure() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    // More transients than the bound of 3 allows
    let id = registry.submit(chain(vec![flaky(10)]), 0).unwrap();

    drain(&registry, &clock).await;

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Failure);
    assert_eq!(job.retry_count, 3);
    let error = job.error.unwrap();
    assert!(error.contains("retries exhausted"), "{error}");
    assert_eq!(job.history.last().unwrap().reason, Some(StopReason::Failure));
}

#[tokio::test]
async fn retry_survives_alongside_healthy_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let flaky_id = registry.submit(chain(vec![flaky(1)]), 0).unwrap();
    let healthy = registry.submit(chain(vec![scripted("ok")]), 0).unwrap();

    drain(&registry, &clock).await;

    assert_eq!(registry.get(&flaky_id).unwrap().state, JobState::Success);
    assert_eq!(registry.get(&healthy).unwrap().state, JobState::Success);
}
