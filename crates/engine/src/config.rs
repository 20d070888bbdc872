// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration.
//!
//! Retry and backoff constants are policy, not protocol, so they are all
//! configurable rather than hard-coded.

use archon_core::BackoffPolicy;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid engine config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Tunables for the registry and scheduler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Size of the worker pool.
    pub workers: usize,
    /// Retry bound applied to submitted jobs.
    pub max_retries: u32,
    /// Backoff base interval (doubled per retry).
    pub backoff_base_ms: u64,
    /// Backoff ceiling.
    pub backoff_cap_ms: u64,
    /// How long an idle worker sleeps before re-polling the runnable queue.
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_retries: 5,
            backoff_base_ms: 1_000,
            backoff_cap_ms: 60_000,
            poll_interval_ms: 25,
        }
    }
}

impl EngineConfig {
    /// Parse from a TOML document; absent keys take defaults.
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::from_millis(self.backoff_base_ms, self.backoff_cap_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    archon_core::setters! {
        set {
            workers: usize,
            max_retries: u32,
            backoff_base_ms: u64,
            backoff_cap_ms: u64,
            poll_interval_ms: u64,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
