// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The scheduler: a fixed-size worker pool driving runnable jobs.
//!
//! Each worker loops claim → step → report. The step itself runs outside
//! every lock, and a job is yielded back to the queue after each step rather
//! than looped on locally, so priority changes and pause/cancel requests
//! take effect at the next boundary and no single job can starve the pool.

use crate::config::EngineConfig;
use crate::registry::Registry;
use archon_core::Clock;
use archon_storage::SnapshotStore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct Scheduler<S: SnapshotStore, C: Clock> {
    registry: Arc<Registry<S, C>>,
    workers: usize,
    poll_interval: Duration,
}

impl<S, C> Scheduler<S, C>
where
    S: SnapshotStore + 'static,
    C: Clock,
{
    pub fn new(registry: Arc<Registry<S, C>>, config: &EngineConfig) -> Self {
        Self {
            registry,
            workers: config.workers.max(1),
            poll_interval: config.poll_interval(),
        }
    }

    /// Drive at most one claim → step → report cycle.
    ///
    /// Returns false when nothing was runnable. This is the deterministic
    /// unit the pool is built from; tests drive it directly.
    pub async fn step_once(registry: &Registry<S, C>) -> bool {
        let Some(claim) = registry.claim() else {
            return false;
        };

        let step = claim
            .chain
            .step_at(claim.cursor, &claim.checkpoint, &claim.outputs)
            .await;
        let code = step.code();

        if let Err(error) = registry.report(&claim.id, step) {
            tracing::error!(job_id = %claim.id, %code, %error, "failed to apply step result");
        }
        true
    }

    /// Run the worker pool until `shutdown` is cancelled.
    ///
    /// In-flight steps finish and report before their workers exit.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut handles = Vec::with_capacity(self.workers);
        for worker in 0..self.workers {
            let registry = self.registry.clone();
            let shutdown = shutdown.clone();
            let poll_interval = self.poll_interval;
            handles.push(tokio::spawn(async move {
                tracing::debug!(worker, "worker started");
                loop {
                    if shutdown.is_cancelled() {
                        break;
                    }
                    if !Self::step_once(&registry).await {
                        tokio::select! {
                            _ = shutdown.cancelled() => break,
                            _ = tokio::time::sleep(poll_interval) => {}
                        }
                    }
                }
                tracing::debug!(worker, "worker stopped");
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
