// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! archon-core: domain model for the Archon job engine
//!
//! The job state machine, the operation-chain contract, step codes and
//! checkpoints, the backoff policy, and the clock abstraction. Everything
//! here is plain data plus pure logic; scheduling and persistence live in
//! `archon-engine` and `archon-storage`.

pub mod macros;

pub mod backoff;
pub mod clock;
pub mod id;
pub mod job;
pub mod operation;
pub mod step;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use backoff::BackoffPolicy;
pub use clock::{Clock, FakeClock, SystemClock};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{Job, JobId, JobSeed, JobState, StopReason, TransitionRecord, HISTORY_CAP};
pub use operation::{
    ChainError, ChainStep, OpStep, Operation, OperationChain, StepContext,
};
pub use step::{Checkpoint, StepCode};
