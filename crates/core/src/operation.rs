// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation-chain contract: the payload seam of the engine.
//!
//! A job's payload is an ordered sequence of [`Operation`]s. The engine never
//! knows what an operation does; it only drives one bounded unit of work at a
//! time through [`OperationChain::step_at`] and applies the resulting
//! [`ChainStep`] to the job state machine.

use crate::step::{Checkpoint, StepCode};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors from operation-chain validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("operation {index} depends on operation {dependency}, which has no output yet")]
    Ordering { index: usize, dependency: usize },
    #[error("operation chain is empty")]
    Empty,
}

/// Read-only context handed to an operation for one step.
pub struct StepContext<'a> {
    checkpoint: &'a Checkpoint,
    outputs: &'a [Option<serde_json::Value>],
}

impl<'a> StepContext<'a> {
    pub fn new(checkpoint: &'a Checkpoint, outputs: &'a [Option<serde_json::Value>]) -> Self {
        Self {
            checkpoint,
            outputs,
        }
    }

    /// The checkpoint recorded by this operation's last `Yield`, if any.
    pub fn checkpoint(&self) -> &Checkpoint {
        self.checkpoint
    }

    /// Output of an earlier operation, by chain index.
    ///
    /// Only indices declared in [`Operation::dependencies`] are guaranteed to
    /// have run already; chain validation enforces that declared indices
    /// precede the operation.
    pub fn output_of(&self, index: usize) -> Option<&serde_json::Value> {
        self.outputs.get(index).and_then(|o| o.as_ref())
    }
}

/// One operation's report for one bounded unit of work.
#[derive(Debug, Clone, PartialEq)]
pub enum OpStep {
    /// This operation finished; optionally publish an output for successors.
    Done { output: Option<serde_json::Value> },
    /// More sub-units remain; resume later from `checkpoint`.
    Yield { checkpoint: Checkpoint },
    /// Transient failure; safe to re-invoke after backoff.
    Transient { error: String },
    /// Unrecoverable failure.
    Fatal { error: String },
}

/// One sub-step of a job's payload.
///
/// Contract notes for implementors:
/// - Steps run at-least-once: a step may be re-invoked with the same
///   checkpoint after a crash or retry, so it must be idempotent or detect
///   partial completion from its checkpoint.
/// - Pause and cancel are observed only between steps. Keep each step short
///   (subdivide long work with `Yield`) so control requests take effect
///   promptly.
#[async_trait]
pub trait Operation: Send + Sync {
    /// Stable kind tag, used to revive the operation from a snapshot.
    fn kind(&self) -> &str;

    /// Chain indices whose outputs this operation consumes.
    ///
    /// Every index must be smaller than this operation's own position;
    /// [`OperationChain::validate`] rejects the chain otherwise.
    fn dependencies(&self) -> Vec<usize> {
        Vec::new()
    }

    /// Execute one bounded unit of work.
    async fn step(&self, ctx: StepContext<'_>) -> OpStep;

    /// Serialize the operation's immutable parameters for persistence.
    fn serialize(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Outcome of one chain step, as reported to the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainStep {
    /// The final operation completed; the chain is done.
    Success {
        /// Output of the last operation, if it published one.
        completed: Option<(usize, serde_json::Value)>,
    },
    /// More steps remain.
    Continue {
        /// Index of the next operation to execute.
        cursor: usize,
        /// Resume state for the operation at `cursor`.
        checkpoint: Checkpoint,
        /// Output of an operation that just completed, if any.
        completed: Option<(usize, serde_json::Value)>,
    },
    /// Transient failure at the current cursor; cursor does not advance.
    Retry { error: String },
    /// Unrecoverable failure; chain execution stops permanently.
    Failure { error: String },
}

impl ChainStep {
    /// Tag-only view for history and logs.
    pub fn code(&self) -> StepCode {
        match self {
            ChainStep::Success { .. } => StepCode::Success,
            ChainStep::Continue { .. } => StepCode::Continue,
            ChainStep::Retry { .. } => StepCode::Retry,
            ChainStep::Failure { .. } => StepCode::Failure,
        }
    }
}

/// An ordered, dependency-validated sequence of operations.
///
/// Immutable after construction; all mutable execution state (cursor,
/// checkpoint, outputs) lives on the job so the chain can be shared between
/// the registry and a stepping worker.
#[derive(Clone)]
pub struct OperationChain {
    ops: Vec<Arc<dyn Operation>>,
}

impl OperationChain {
    pub fn new(ops: Vec<Arc<dyn Operation>>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterate the operations in chain order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Operation>> {
        self.ops.iter()
    }

    /// Check the ordering invariant: operation `k` may depend only on
    /// operations with index `< k`.
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.ops.is_empty() {
            return Err(ChainError::Empty);
        }
        for (index, op) in self.ops.iter().enumerate() {
            for dependency in op.dependencies() {
                if dependency >= index {
                    return Err(ChainError::Ordering { index, dependency });
                }
            }
        }
        Ok(())
    }

    /// Execute exactly one bounded unit of work at `cursor`.
    ///
    /// The caller owns cursor/checkpoint/outputs and applies the returned
    /// transition; this method never mutates shared state.
    pub async fn step_at(
        &self,
        cursor: usize,
        checkpoint: &Checkpoint,
        outputs: &[Option<serde_json::Value>],
    ) -> ChainStep {
        let Some(op) = self.ops.get(cursor) else {
            return ChainStep::Failure {
                error: format!("cursor {} out of range for chain of {}", cursor, self.ops.len()),
            };
        };

        match op.step(StepContext::new(checkpoint, outputs)).await {
            OpStep::Done { output } => {
                let completed = output.map(|value| (cursor, value));
                if cursor + 1 == self.ops.len() {
                    ChainStep::Success { completed }
                } else {
                    ChainStep::Continue {
                        cursor: cursor + 1,
                        checkpoint: Checkpoint::default(),
                        completed,
                    }
                }
            }
            OpStep::Yield { checkpoint } => ChainStep::Continue {
                cursor,
                checkpoint,
                completed: None,
            },
            OpStep::Transient { error } => ChainStep::Retry { error },
            OpStep::Fatal { error } => ChainStep::Failure { error },
        }
    }
}

#[cfg(test)]
#[path = "operation_tests.rs"]
mod tests;
