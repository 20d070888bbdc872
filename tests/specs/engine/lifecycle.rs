// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-lifecycle specs
//!
//! A job travels Pending → Running → Success with progress, outputs, and
//! history recorded, and every transition is durable in the file store.

use crate::prelude::*;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn chain_runs_to_success_with_durable_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = Registry::new(
        FileStore::open(dir.path()).unwrap(),
        clock.clone(),
        &spec_config(),
    );

    let id = registry
        .submit(
            chain(vec![scripted("unpack"), scripted("index"), scripted("seal")]),
            0,
        )
        .unwrap();

    let steps = drain(&registry, &clock).await;
    assert_eq!(steps, 3);

    let job = registry.get(&id).unwrap();
    assert_eq!(job.state, JobState::Success);
    assert_eq!(job.cursor, 3);
    assert_eq!(job.progress, 1.0);
    assert_eq!(
        job.state_sequence(),
        vec![JobState::Pending, JobState::Running, JobState::Success]
    );
    assert_eq!(job.history.last().unwrap().reason, Some(StopReason::Success));

    // The terminal state is what a fresh reader of the store sees
    let reloaded = FileStore::open(dir.path()).unwrap().load_all().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].job.state, JobState::Success);
}

#[tokio::test]
async fn progress_reflects_completed_operations() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    let registry = Registry::new(
        FileStore::open(dir.path()).unwrap(),
        clock.clone(),
        &spec_config(),
    );

    let id = registry
        .submit(chain(vec![scripted("a"), scripted("b"), scripted("c"), scripted("d")]), 0)
        .unwrap();

    let mut seen = vec![registry.get(&id).unwrap().progress];
    while !registry.get(&id).unwrap().is_terminal() {
        Scheduler::step_once(&registry).await;
        seen.push(registry.get(&id).unwrap().progress);
    }

    // Monotone, ending at exactly 1.0
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn worker_pool_completes_a_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = spec_config().workers(4);
    let registry = Arc::new(Registry::new(
        FileStore::open(dir.path()).unwrap(),
        FakeClock::new(),
        &config,
    ));

    let mut ids = Vec::new();
    for i in 0..10 {
        ids.push(
            registry
                .submit(chain(vec![scripted("first"), scripted("second")]), i)
                .unwrap(),
        );
    }

    let scheduler = Scheduler::new(registry.clone(), &config);
    let shutdown = CancellationToken::new();
    let pool = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move { scheduler.run(shutdown).await })
    };

    loop {
        let done = ids
            .iter()
            .all(|id| registry.get(id).map(|j| j.is_terminal()).unwrap_or(false));
        if done {
            break;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    shutdown.cancel();
    pool.await.unwrap();

    for id in &ids {
        assert_eq!(registry.get(id).unwrap().state, JobState::Success);
    }
}
