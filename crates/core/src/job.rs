// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use crate::step::Checkpoint;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a submitted job.
    ///
    /// Assigned once at submission and immutable afterwards; used to query
    /// status, request pause/cancel, and reference the job in logs.
    pub struct JobId("job-");
}

/// Lifecycle state of a job.
///
/// `Pending` is the initial state; `Success` and `Failure` are terminal.
/// All transitions are applied by the registry — see the transition logic
/// in `archon-engine`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting in the runnable queue.
    Pending,
    /// A worker owns the job; steps execute one at a time.
    Running,
    /// Stopped cooperatively; resumable via the control surface.
    Paused,
    /// Transient step failure; runnable again once the backoff elapses.
    Retry,
    /// Chain completed.
    Success,
    /// Unrecoverable failure, cancellation, or retries exhausted.
    Failure,
}

impl JobState {
    /// Check if this state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

crate::simple_display! {
    JobState {
        Pending => "pending",
        Running => "running",
        Paused => "paused",
        Retry => "retry",
        Success => "success",
        Failure => "failure",
    }
}

/// Why a job left the `Running` state.
///
/// A `Retry` stop and a `Failure` stop can look alike to a naive observer;
/// the reason recorded in history disambiguates the edge independently of
/// the resulting state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Paused,
    Canceled,
    Success,
    Failure,
    Retry,
}

crate::simple_display! {
    StopReason {
        Paused => "paused",
        Canceled => "canceled",
        Success => "success",
        Failure => "failure",
        Retry => "retry",
    }
}

/// One entry in a job's transition history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub at_ms: u64,
    pub from: JobState,
    pub to: JobState,
    /// Stop reason; present only on edges leaving `Running`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<StopReason>,
}

/// Maximum number of history entries retained per job. Oldest entries are
/// dropped first; history is for observability, not recovery.
pub const HISTORY_CAP: usize = 128;

/// Immutable creation parameters for a job.
#[derive(Debug, Clone)]
pub struct JobSeed {
    pub id: JobId,
    pub priority: i32,
    pub max_retries: u32,
    pub chain_len: usize,
    pub submitted_seq: u64,
}

impl JobSeed {
    pub fn new(id: JobId, chain_len: usize) -> Self {
        Self {
            id,
            priority: 0,
            max_retries: 0,
            chain_len,
            submitted_seq: 0,
        }
    }

    crate::setters! {
        set {
            priority: i32,
            max_retries: u32,
            submitted_seq: u64,
        }
    }
}

/// A stateful unit of long-running, resumable work.
///
/// Only the registry mutates a job once submitted: state, cursor, progress,
/// checkpoint, and retry bookkeeping change through step reports; external
/// callers only set the cooperative `pause_requested` / `cancel_requested`
/// flags, which workers observe between steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub state: JobState,
    /// Higher runs first among runnable jobs.
    pub priority: i32,
    /// Index of the next operation to execute.
    pub cursor: usize,
    /// Fraction in [0, 1], non-decreasing while Running.
    pub progress: f32,
    pub retry_count: u32,
    pub max_retries: u32,
    /// Epoch ms before which a Retry job is not runnable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_eligible_ms: Option<u64>,
    #[serde(default)]
    pub cancel_requested: bool,
    #[serde(default)]
    pub pause_requested: bool,
    /// Last failure detail; present only after Failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Opaque resume state from the current operation.
    #[serde(default)]
    pub checkpoint: Checkpoint,
    /// Outputs produced by completed operations, indexed by chain position.
    /// Downstream operations read their declared dependencies from here.
    #[serde(default)]
    pub outputs: Vec<Option<serde_json::Value>>,
    /// Append-only transition log, capped at [`HISTORY_CAP`].
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
    /// Submission order tiebreaker among equal-priority jobs.
    pub submitted_seq: u64,
    pub created_at_ms: u64,
}

impl Job {
    /// Create a job in the Pending state.
    pub fn new(seed: JobSeed, epoch_ms: u64) -> Self {
        Self {
            id: seed.id,
            state: JobState::Pending,
            priority: seed.priority,
            cursor: 0,
            progress: 0.0,
            retry_count: 0,
            max_retries: seed.max_retries,
            next_eligible_ms: None,
            cancel_requested: false,
            pause_requested: false,
            error: None,
            checkpoint: Checkpoint::default(),
            outputs: vec![None; seed.chain_len],
            history: Vec::new(),
            submitted_seq: seed.submitted_seq,
            created_at_ms: epoch_ms,
        }
    }

    /// Apply a state transition and record it in history.
    ///
    /// No-op transitions (same state) are not recorded.
    pub fn transition(&mut self, to: JobState, reason: Option<StopReason>, at_ms: u64) {
        if self.state == to {
            return;
        }
        if self.history.len() >= HISTORY_CAP {
            self.history.remove(0);
        }
        self.history.push(TransitionRecord {
            at_ms,
            from: self.state,
            to,
            reason,
        });
        self.state = to;
    }

    /// Raise progress; never lowers it, and clamps to [0, 1].
    pub fn advance_progress(&mut self, fraction: f32) {
        let clamped = fraction.clamp(0.0, 1.0);
        if clamped > self.progress {
            self.progress = clamped;
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Check if a Retry job's backoff has elapsed.
    pub fn retry_elapsed(&self, now_ms: u64) -> bool {
        self.state == JobState::Retry
            && self.next_eligible_ms.is_none_or(|eligible| eligible <= now_ms)
    }

    /// Sequence of states the job has passed through, starting with the
    /// earliest recorded `from` state.
    pub fn state_sequence(&self) -> Vec<JobState> {
        let mut states = Vec::with_capacity(self.history.len() + 1);
        match self.history.first() {
            Some(first) => {
                states.push(first.from);
                states.extend(self.history.iter().map(|r| r.to));
            }
            None => states.push(self.state),
        }
        states
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            id: JobId = "job-test-1",
        }
        set {
            state: JobState = JobState::Pending,
            priority: i32 = 0,
            cursor: usize = 0,
            progress: f32 = 0.0,
            retry_count: u32 = 0,
            max_retries: u32 = 3,
            cancel_requested: bool = false,
            pause_requested: bool = false,
            checkpoint: Checkpoint = Checkpoint::default(),
            outputs: Vec<Option<serde_json::Value>> = Vec::new(),
            history: Vec<TransitionRecord> = Vec::new(),
            submitted_seq: u64 = 0,
            created_at_ms: u64 = 0,
        }
        option {
            next_eligible_ms: u64 = None,
            error: String = None,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
