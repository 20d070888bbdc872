// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative control specs
//!
//! Pause and cancel are requests, not interrupts: they take effect at the
//! next step boundary, and a paused job resumes from its exact checkpoint.

use crate::prelude::*;

fn file_registry(dir: &tempfile::TempDir, clock: FakeClock) -> Registry<FileStore, FakeClock> {
    Registry::new(FileStore::open(dir.path()).unwrap(), clock, &spec_config())
}

#[tokio::test]
async fn pause_resume_completes_from_the_same_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry
        .submit(
            chain(vec![
                Arc::new(CountdownOp::new(4)) as Arc<dyn Operation>,
            ]),
            0,
        )
        .unwrap();

    // Two of four units, then pause; the flag applies before the next step
    Scheduler::step_once(&registry).await;
    Scheduler::step_once(&registry).await;
    registry.request_pause(&id).unwrap();
    assert!(!Scheduler::step_once(&registry).await);

    let paused = registry.get(&id).unwrap();
    assert_eq!(paused.state, JobState::Paused);
    assert_eq!(paused.checkpoint, Checkpoint::new(json!({ "done": 2 })));
    assert_eq!(paused.history.last().unwrap().reason, Some(StopReason::Paused));

    // Nothing to do while paused
    assert!(!Scheduler::step_once(&registry).await);

    registry.resume(&id).unwrap();
    drain(&registry, &clock).await;

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Success);
    assert_eq!(job.outputs[0], Some(json!({ "steps": 4 })));
}

#[tokio::test]
async fn cancel_before_any_step_runs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry.submit(chain(vec![scripted("never")]), 0).unwrap();

    registry.request_cancel(&id).unwrap();
    let steps = drain(&registry, &clock).await;
    assert_eq!(steps, 0);

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Failure);
    assert_eq!(job.cursor, 0);
    assert_eq!(job.history.last().unwrap().reason, Some(StopReason::Canceled));
}

#[tokio::test]
async fn cancel_mid_chain_stops_at_the_next_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry
        .submit(chain(vec![scripted("a"), scripted("b"), scripted("c")]), 0)
        .unwrap();

    Scheduler::step_once(&registry).await;
    registry.request_cancel(&id).unwrap();
    drain(&registry, &clock).await;

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Failure);
    // The second operation never ran
    assert_eq!(job.cursor, 1);
    assert_eq!(job.outputs[1], None);
    assert_eq!(job.history.last().unwrap().reason, Some(StopReason::Canceled));
}

#[tokio::test]
async fn cancel_of_a_paused_job_is_immediate() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry
        .submit(chain(vec![scripted("a"), scripted("b")]), 0)
        .unwrap();

    registry.request_pause(&id).unwrap();
    drain(&registry, &clock).await;
    assert_eq!(registry.get(&id).unwrap().state, JobState::Paused);

    registry.request_cancel(&id).unwrap();
    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Failure);
    assert_eq!(job.history.last().unwrap().reason, Some(StopReason::Canceled));
}

#[tokio::test]
async fn terminal_jobs_reject_control_requests() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = file_registry(&dir, clock.clone());
    let id = registry.submit(chain(vec![scripted("only")]), 0).unwrap();
    drain(&registry, &clock).await;
    assert_eq!(registry.get(&id).unwrap().state, JobState::Success);

    assert!(matches!(
        registry.request_pause(&id),
        Err(RegistryError::InvalidState { .. })
    ));
    assert!(matches!(
        registry.request_cancel(&id),
        Err(RegistryError::InvalidState { .. })
    ));
    assert!(matches!(
        registry.resume(&id),
        Err(RegistryError::InvalidState { .. })
    ));
}
