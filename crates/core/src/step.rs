// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step outcome codes and opaque resume checkpoints.

use serde::{Deserialize, Serialize};

/// Tag-only outcome of one chain step, used in reporting DTOs and logs.
///
/// The data-carrying form is [`crate::operation::ChainStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepCode {
    /// The whole chain is complete.
    Success,
    /// More steps remain; the job goes back to the runnable queue.
    Continue,
    /// Transient failure; re-invoke after backoff.
    Retry,
    /// Unrecoverable; execution stops permanently.
    Failure,
}

crate::simple_display! {
    StepCode {
        Success => "success",
        Continue => "continue",
        Retry => "retry",
        Failure => "failure",
    }
}

/// Opaque serialized resume state produced by an operation.
///
/// The engine never inspects the payload; it stores whatever the current
/// operation yielded and hands it back verbatim on the next step. Re-invoking
/// a step with the same checkpoint must be safe (at-least-once semantics),
/// so operations must encode enough state here to detect partial completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint(Option<serde_json::Value>);

impl Checkpoint {
    /// Wrap an operation-defined resume payload.
    pub fn new(value: serde_json::Value) -> Self {
        Self(Some(value))
    }

    /// The payload, if one was recorded.
    pub fn value(&self) -> Option<&serde_json::Value> {
        self.0.as_ref()
    }

    /// True when no resume state has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
