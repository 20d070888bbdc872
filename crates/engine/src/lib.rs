// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! archon-engine: the job registry and scheduler.
//!
//! The registry owns every known job and is the single source of truth for
//! state transitions; the scheduler is a worker pool that drives runnable
//! jobs through their operation chains one step at a time. Callers (protocol
//! layers, REST front ends, scripts) interact only through the registry's
//! submit/control/get surface.

pub mod config;
pub mod registry;
pub mod revive;
pub mod scheduler;

pub use config::{ConfigError, EngineConfig};
pub use registry::{Claim, Registry, RegistryError};
pub use revive::{KindResolver, OperationResolver, ReviveError};
pub use scheduler::Scheduler;
