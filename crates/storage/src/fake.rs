// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory snapshot store for tests, with failure injection.

use crate::snapshot::JobSnapshot;
use crate::store::{SnapshotStore, StoreError};
use archon_core::JobId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// In-memory [`SnapshotStore`] with a toggle that makes every call fail,
/// for exercising the persistence-failure path.
#[derive(Clone, Default)]
pub struct FakeStore {
    inner: Arc<Mutex<FakeStoreInner>>,
}

#[derive(Default)]
struct FakeStoreInner {
    snapshots: BTreeMap<JobId, JobSnapshot>,
    fail: bool,
    saves: u64,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent store call fail with `StoreError::Unavailable`.
    pub fn set_fail(&self, fail: bool) {
        self.inner.lock().fail = fail;
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> u64 {
        self.inner.lock().saves
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.inner.lock().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().snapshots.is_empty()
    }

    /// Fetch one stored snapshot by id.
    pub fn get(&self, id: &JobId) -> Option<JobSnapshot> {
        self.inner.lock().snapshots.get(id).cloned()
    }
}

impl SnapshotStore for FakeStore {
    fn save(&self, id: &JobId, snapshot: &JobSnapshot) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        inner.snapshots.insert(id.clone(), snapshot.clone());
        inner.saves += 1;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<JobSnapshot>, StoreError> {
        let inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        Ok(inner.snapshots.values().cloned().collect())
    }

    fn remove(&self, id: &JobId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if inner.fail {
            return Err(StoreError::Unavailable("injected failure".to_string()));
        }
        inner.snapshots.remove(id);
        Ok(())
    }
}
