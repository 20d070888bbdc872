// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reviving persisted operation descriptors into live operations.
//!
//! Operation kinds are registered by the embedding system (the protocol,
//! REST, and scripting layers that produce job payloads); the engine only
//! knows the kind tag it stored in the snapshot.

use archon_core::Operation;
use archon_storage::StoredOperation;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviveError {
    #[error("unknown operation kind: {0}")]
    UnknownKind(String),
    #[error("invalid payload for operation kind {kind}: {error}")]
    Payload { kind: String, error: String },
}

/// Rebuilds an [`Operation`] from its persisted descriptor.
pub trait OperationResolver: Send + Sync {
    fn revive(&self, op: &StoredOperation) -> Result<Arc<dyn Operation>, ReviveError>;
}

type Factory =
    Box<dyn Fn(&StoredOperation) -> Result<Arc<dyn Operation>, ReviveError> + Send + Sync>;

/// Resolver backed by a per-kind factory map.
#[derive(Default)]
pub struct KindResolver {
    factories: HashMap<String, Factory>,
}

impl KindResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for one operation kind.
    pub fn register(
        mut self,
        kind: impl Into<String>,
        factory: impl Fn(&StoredOperation) -> Result<Arc<dyn Operation>, ReviveError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.factories.insert(kind.into(), Box::new(factory));
        self
    }
}

impl OperationResolver for KindResolver {
    fn revive(&self, op: &StoredOperation) -> Result<Arc<dyn Operation>, ReviveError> {
        match self.factories.get(&op.kind) {
            Some(factory) => factory(op),
            None => Err(ReviveError::UnknownKind(op.kind.clone())),
        }
    }
}

#[cfg(test)]
#[path = "revive_tests.rs"]
mod tests;
