// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! archon-storage: durable snapshot persistence for the job registry.
//!
//! The engine treats this layer as crash-durable: every applied transition is
//! saved here before the registry returns control, and startup recovery is a
//! plain `load_all`.

pub mod snapshot;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeStore;
pub use snapshot::{JobSnapshot, StoredOperation};
pub use store::{FileStore, SnapshotStore, StoreError};
