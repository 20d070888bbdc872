// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Capped exponential backoff for retrying jobs.

use std::time::Duration;

/// Pure mapping from retry count to next-eligible delay.
///
/// `delay(n) = min(base * 2^n, cap)`, saturating. No hidden state, so the
/// same retry count always yields the same delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    base_ms: u64,
    cap_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base: Duration, cap: Duration) -> Self {
        Self {
            base_ms: base.as_millis() as u64,
            cap_ms: cap.as_millis() as u64,
        }
    }

    pub fn from_millis(base_ms: u64, cap_ms: u64) -> Self {
        Self { base_ms, cap_ms }
    }

    /// Delay before the `retry_count`-th retry becomes eligible.
    pub fn delay(&self, retry_count: u32) -> Duration {
        let factor = 1u64.checked_shl(retry_count).unwrap_or(u64::MAX);
        let ms = self.base_ms.saturating_mul(factor).min(self.cap_ms);
        Duration::from_millis(ms)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            cap_ms: 60_000,
        }
    }
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
