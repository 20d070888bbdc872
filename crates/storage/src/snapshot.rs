// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Serialized form of a job and its operation chain.

use archon_core::{Job, Operation, OperationChain};
use serde::{Deserialize, Serialize};

/// Persisted descriptor of one operation: its kind tag, declared
/// dependencies, and serialized parameters. Revived into a live
/// [`Operation`] by the engine's resolver at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOperation {
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<usize>,
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StoredOperation {
    pub fn from_operation(op: &dyn Operation) -> Self {
        Self {
            kind: op.kind().to_string(),
            deps: op.dependencies(),
            data: op.serialize(),
        }
    }
}

/// Durable snapshot of one job: the full job record plus the immutable
/// operation descriptors needed to rebuild its chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job: Job,
    pub ops: Vec<StoredOperation>,
}

impl JobSnapshot {
    pub fn new(job: Job, chain: &OperationChain) -> Self {
        Self {
            job,
            ops: chain
                .iter()
                .map(|op| StoredOperation::from_operation(op.as_ref()))
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
