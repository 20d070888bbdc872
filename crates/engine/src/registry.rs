// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job registry: authoritative store and transition arbiter.
//!
//! All job mutation funnels through here. Workers propose transitions (step
//! results); external callers set cooperative flags or resume paused jobs.
//! Every applied transition is persisted before control returns, so restart
//! recovery is a plain reload. A job whose snapshot cannot be persisted is
//! quarantined: the in-memory state keeps matching durable state instead of
//! silently diverging.

use crate::config::EngineConfig;
use crate::revive::{OperationResolver, ReviveError};
use archon_core::{
    BackoffPolicy, ChainError, ChainStep, Checkpoint, Clock, Job, JobId, JobSeed, JobState,
    OperationChain, StopReason,
};
use archon_storage::{JobSnapshot, SnapshotStore, StoreError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors from the registry's submit/control/report surface.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid operation chain: {0}")]
    Ordering(#[from] ChainError),
    #[error("job not found: {0}")]
    NotFound(JobId),
    #[error("{op} not valid for job {id} in state {state}")]
    InvalidState {
        op: &'static str,
        id: JobId,
        state: JobState,
    },
    #[error("job {0} is refusing transitions after a persistence failure")]
    Quarantined(JobId),
    #[error("persistence error: {0}")]
    Persistence(#[from] StoreError),
    #[error("failed to revive job {id}: {error}")]
    Revive { id: JobId, error: ReviveError },
}

/// A job handed to a worker for exactly one step.
///
/// Holds everything the step needs so the worker never touches the job table
/// while executing; `report` hands the result back.
pub struct Claim {
    pub id: JobId,
    pub cursor: usize,
    pub checkpoint: Checkpoint,
    pub outputs: Vec<Option<serde_json::Value>>,
    pub chain: Arc<OperationChain>,
}

struct JobEntry {
    job: Job,
    chain: Arc<OperationChain>,
    /// A worker currently owns a step for this job.
    claimed: bool,
    /// Persistence failed; no further transitions are accepted.
    quarantined: bool,
}

type Entry = Arc<Mutex<JobEntry>>;

struct JobTable {
    entries: HashMap<JobId, Entry>,
    next_seq: u64,
}

/// Owns the set of all known jobs; arbitrates concurrent access.
///
/// The outer table lock is held only to look up or insert entries; each
/// job's read-modify-persist sequence is serialized by its own entry lock,
/// so unrelated jobs proceed concurrently and `get` never waits on an
/// executing step.
pub struct Registry<S: SnapshotStore, C: Clock> {
    store: S,
    clock: C,
    backoff: BackoffPolicy,
    default_max_retries: u32,
    jobs: Mutex<JobTable>,
}

impl<S: SnapshotStore, C: Clock> Registry<S, C> {
    pub fn new(store: S, clock: C, config: &EngineConfig) -> Self {
        Self {
            store,
            clock,
            backoff: config.backoff(),
            default_max_retries: config.max_retries,
            jobs: Mutex::new(JobTable {
                entries: HashMap::new(),
                next_seq: 0,
            }),
        }
    }

    /// Reload persisted jobs at startup.
    ///
    /// A job persisted as Running was interrupted mid-step; it re-enters the
    /// queue as Pending with its checkpoint intact, which is safe under the
    /// at-least-once step contract.
    pub fn restore(
        store: S,
        resolver: &dyn OperationResolver,
        clock: C,
        config: &EngineConfig,
    ) -> Result<Self, RegistryError> {
        let snapshots = store.load_all()?;
        let registry = Self::new(store, clock, config);

        let mut restored = 0usize;
        let mut requeued = 0usize;
        {
            let mut table = registry.jobs.lock();
            for JobSnapshot { mut job, ops } in snapshots {
                let mut revived: Vec<Arc<dyn archon_core::Operation>> =
                    Vec::with_capacity(ops.len());
                for op in &ops {
                    match resolver.revive(op) {
                        Ok(live) => revived.push(live),
                        Err(error) => {
                            return Err(RegistryError::Revive {
                                id: job.id.clone(),
                                error,
                            })
                        }
                    }
                }
                let chain = Arc::new(OperationChain::new(revived));

                if job.state == JobState::Running {
                    job.transition(JobState::Pending, None, registry.clock.epoch_ms());
                    registry
                        .store
                        .save(&job.id, &JobSnapshot::new(job.clone(), &chain))?;
                    requeued += 1;
                }

                table.next_seq = table.next_seq.max(job.submitted_seq + 1);
                restored += 1;
                table.entries.insert(
                    job.id.clone(),
                    Arc::new(Mutex::new(JobEntry {
                        job,
                        chain,
                        claimed: false,
                        quarantined: false,
                    })),
                );
            }
        }

        tracing::info!(restored, requeued, "registry restored from snapshots");
        Ok(registry)
    }

    /// Submit a new job. The chain is validated and the Pending snapshot is
    /// persisted before the job becomes visible; on any error no job exists.
    pub fn submit(
        &self,
        chain: OperationChain,
        priority: i32,
    ) -> Result<JobId, RegistryError> {
        chain.validate()?;
        let chain = Arc::new(chain);
        let id = JobId::new();

        let mut table = self.jobs.lock();
        let seed = JobSeed::new(id.clone(), chain.len())
            .priority(priority)
            .max_retries(self.default_max_retries)
            .submitted_seq(table.next_seq);
        let job = Job::new(seed, self.clock.epoch_ms());

        self.store.save(&id, &JobSnapshot::new(job.clone(), &chain))?;

        table.next_seq += 1;
        table.entries.insert(
            id.clone(),
            Arc::new(Mutex::new(JobEntry {
                job,
                chain: chain.clone(),
                claimed: false,
                quarantined: false,
            })),
        );

        tracing::info!(job_id = %id, priority, ops = chain.len(), "job submitted");
        Ok(id)
    }

    /// Read-only snapshot of one job's current state.
    pub fn get(&self, id: &JobId) -> Result<Job, RegistryError> {
        Ok(self.entry(id)?.lock().job.clone())
    }

    /// Number of known jobs, terminal included.
    pub fn job_count(&self) -> usize {
        self.jobs.lock().entries.len()
    }

    /// Request a cooperative pause. The flag is observed at the next step
    /// boundary; a job waiting in the queue pauses before its next step runs.
    pub fn request_pause(&self, id: &JobId) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut e = entry.lock();
        self.check_quarantine(&e, id)?;
        match e.job.state {
            JobState::Pending | JobState::Running | JobState::Retry => {
                let mut updated = e.job.clone();
                updated.pause_requested = true;
                self.commit(&mut e, updated)
            }
            state => Err(RegistryError::InvalidState {
                op: "pause",
                id: id.clone(),
                state,
            }),
        }
    }

    /// Request cancellation. Running/queued jobs observe the flag at the
    /// next step boundary; a Paused job has no upcoming boundary, so it
    /// fails immediately with reason Canceled.
    pub fn request_cancel(&self, id: &JobId) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut e = entry.lock();
        self.check_quarantine(&e, id)?;
        match e.job.state {
            JobState::Pending | JobState::Running | JobState::Retry => {
                let mut updated = e.job.clone();
                updated.cancel_requested = true;
                self.commit(&mut e, updated)
            }
            JobState::Paused => {
                let mut updated = e.job.clone();
                updated.error = Some("canceled".to_string());
                updated.transition(
                    JobState::Failure,
                    Some(StopReason::Canceled),
                    self.clock.epoch_ms(),
                );
                self.commit(&mut e, updated)
            }
            state => Err(RegistryError::InvalidState {
                op: "cancel",
                id: id.clone(),
                state,
            }),
        }
    }

    /// Return a Paused job to the run queue at its original priority.
    pub fn resume(&self, id: &JobId) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut e = entry.lock();
        self.check_quarantine(&e, id)?;
        match e.job.state {
            JobState::Paused => {
                let mut updated = e.job.clone();
                updated.pause_requested = false;
                updated.transition(JobState::Pending, None, self.clock.epoch_ms());
                self.commit(&mut e, updated)
            }
            state => Err(RegistryError::InvalidState {
                op: "resume",
                id: id.clone(),
                state,
            }),
        }
    }

    /// Ids of runnable jobs in scheduling order: priority desc, then
    /// retry-ready jobs, then queued jobs by submission order.
    pub fn runnable_ids(&self, now_ms: u64) -> Vec<JobId> {
        let entries: Vec<Entry> = self.jobs.lock().entries.values().cloned().collect();

        let mut candidates: Vec<(i32, u8, u64, JobId)> = Vec::new();
        for entry in entries {
            let e = entry.lock();
            if e.claimed || e.quarantined {
                continue;
            }
            let class = match e.job.state {
                JobState::Retry if e.job.retry_elapsed(now_ms) => 0,
                // Running-but-unclaimed means the job yielded between steps
                JobState::Pending | JobState::Running => 1,
                _ => continue,
            };
            candidates.push((e.job.priority, class, e.job.submitted_seq, e.job.id.clone()));
        }

        candidates.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });
        candidates.into_iter().map(|(_, _, _, id)| id).collect()
    }

    /// Claim the highest-priority runnable job for one step.
    ///
    /// Marks the job Running atomically, so two workers can never hold the
    /// same job. Cooperative flags are observed here: a flagged candidate
    /// transitions to Paused or Failure(Canceled) without running a step and
    /// claiming moves on to the next candidate.
    pub fn claim(&self) -> Option<Claim> {
        let now = self.clock.epoch_ms();
        for id in self.runnable_ids(now) {
            let Some(entry) = self.entry_opt(&id) else {
                continue;
            };
            let mut e = entry.lock();
            if e.claimed || e.quarantined {
                continue;
            }
            let runnable = matches!(e.job.state, JobState::Pending | JobState::Running)
                || e.job.retry_elapsed(now);
            if !runnable {
                continue;
            }

            if e.job.cancel_requested {
                let mut updated = e.job.clone();
                updated.transition(JobState::Running, None, now);
                updated.error = Some("canceled".to_string());
                updated.cancel_requested = false;
                updated.transition(JobState::Failure, Some(StopReason::Canceled), now);
                let _ = self.commit(&mut e, updated);
                continue;
            }
            if e.job.pause_requested {
                let mut updated = e.job.clone();
                updated.transition(JobState::Running, None, now);
                updated.pause_requested = false;
                updated.transition(JobState::Paused, Some(StopReason::Paused), now);
                let _ = self.commit(&mut e, updated);
                continue;
            }

            let mut updated = e.job.clone();
            updated.next_eligible_ms = None;
            updated.transition(JobState::Running, None, now);
            if self.commit(&mut e, updated).is_err() {
                continue;
            }
            e.claimed = true;
            tracing::debug!(job_id = %id, cursor = e.job.cursor, "job claimed");
            return Some(Claim {
                id: id.clone(),
                cursor: e.job.cursor,
                checkpoint: e.job.checkpoint.clone(),
                outputs: e.job.outputs.clone(),
                chain: e.chain.clone(),
            });
        }
        None
    }

    /// Apply a step result for a claimed job.
    ///
    /// This is the transition table: Success/Failure terminate, Continue
    /// re-checks the cooperative flags, Retry consults the retry bound and
    /// backoff. The resulting snapshot is persisted before returning.
    pub fn report(&self, id: &JobId, step: ChainStep) -> Result<(), RegistryError> {
        let entry = self.entry(id)?;
        let mut e = entry.lock();
        if !e.claimed || e.job.state != JobState::Running {
            return Err(RegistryError::InvalidState {
                op: "report",
                id: id.clone(),
                state: e.job.state,
            });
        }
        // The worker is done with this job whatever the outcome
        e.claimed = false;
        self.check_quarantine(&e, id)?;

        let now = self.clock.epoch_ms();
        let chain_len = e.chain.len().max(1);
        let code = step.code();
        let mut updated = e.job.clone();

        match step {
            ChainStep::Success { completed } => {
                record_output(&mut updated, completed);
                updated.cursor = chain_len;
                updated.checkpoint = Checkpoint::default();
                updated.progress = 1.0;
                updated.transition(JobState::Success, Some(StopReason::Success), now);
            }
            ChainStep::Failure { error } => {
                updated.error = Some(error);
                updated.transition(JobState::Failure, Some(StopReason::Failure), now);
            }
            ChainStep::Continue {
                cursor,
                checkpoint,
                completed,
            } => {
                record_output(&mut updated, completed);
                updated.cursor = cursor;
                updated.checkpoint = checkpoint;
                updated.advance_progress(cursor as f32 / chain_len as f32);
                if updated.cancel_requested {
                    updated.cancel_requested = false;
                    updated.error = Some("canceled".to_string());
                    updated.transition(JobState::Failure, Some(StopReason::Canceled), now);
                } else if updated.pause_requested {
                    updated.pause_requested = false;
                    updated.transition(JobState::Paused, Some(StopReason::Paused), now);
                }
                // Otherwise the job stays Running and re-enters the queue
            }
            ChainStep::Retry { error } => {
                if updated.retry_count >= updated.max_retries {
                    updated.error = Some(format!(
                        "retries exhausted after {} attempts: {}",
                        updated.retry_count, error
                    ));
                    updated.transition(JobState::Failure, Some(StopReason::Failure), now);
                } else {
                    updated.retry_count += 1;
                    let delay = self.backoff.delay(updated.retry_count);
                    updated.next_eligible_ms = Some(now + delay.as_millis() as u64);
                    updated.transition(JobState::Retry, Some(StopReason::Retry), now);
                }
            }
        }

        tracing::info!(
            job_id = %id,
            %code,
            state = %updated.state,
            progress = updated.progress,
            retries = updated.retry_count,
            "step reported"
        );
        self.commit(&mut e, updated)
    }

    fn entry(&self, id: &JobId) -> Result<Entry, RegistryError> {
        self.entry_opt(id)
            .ok_or_else(|| RegistryError::NotFound(id.clone()))
    }

    fn entry_opt(&self, id: &JobId) -> Option<Entry> {
        self.jobs.lock().entries.get(id).cloned()
    }

    fn check_quarantine(&self, e: &JobEntry, id: &JobId) -> Result<(), RegistryError> {
        if e.quarantined {
            Err(RegistryError::Quarantined(id.clone()))
        } else {
            Ok(())
        }
    }

    /// Persist an updated job, then commit it to memory. If the save fails
    /// the in-memory job is left untouched and the entry is quarantined:
    /// better to refuse transitions than to diverge from durable state.
    fn commit(&self, e: &mut JobEntry, updated: Job) -> Result<(), RegistryError> {
        let snapshot = JobSnapshot::new(updated.clone(), &e.chain);
        match self.store.save(&updated.id, &snapshot) {
            Ok(()) => {
                e.job = updated;
                Ok(())
            }
            Err(error) => {
                e.quarantined = true;
                tracing::error!(job_id = %updated.id, %error, "snapshot save failed; job quarantined");
                Err(RegistryError::Persistence(error))
            }
        }
    }
}

fn record_output(job: &mut Job, completed: Option<(usize, serde_json::Value)>) {
    if let Some((index, value)) = completed {
        if let Some(slot) = job.outputs.get_mut(index) {
            *slot = Some(value);
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
