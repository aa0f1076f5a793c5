// SPDX-FileCopyrightText: 2026 Crosspost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff for publish retries.

use std::time::Duration;

use crosspost_config::model::RetryConfig;
use rand::Rng;

/// Retry policy: `base * 2^(n-1)` capped at `max`, plus jitter, floored by retry-after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    base: Duration,
    max: Duration,
    jitter_ratio: f64,
    max_attempts: u32,
}

impl BackoffPolicy {
    pub fn new(base: Duration, max: Duration, jitter_ratio: f64, max_attempts: u32) -> Self {
        Self {
            base,
            max: max.max(base),
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.jitter_ratio,
            config.max_attempts,
        )
    }

    /// Total publish attempts allowed, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    pub fn allows_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Deterministic delay after the `failures`-th consecutive failure (1-based).
    pub fn base_delay(&self, failures: u32) -> Duration {
        let exp = failures.saturating_sub(1).min(31);
        self.base.saturating_mul(1u32 << exp).min(self.max)
    }

    /// Delay before the next attempt, with jitter from the thread-local RNG.
    pub fn delay(&self, failures: u32, retry_after: Option<Duration>) -> Duration {
        self.delay_with(failures, retry_after, &mut rand::thread_rng())
    }

    /// Delay before the next attempt using the given RNG.
    pub fn delay_with<R: Rng + ?Sized>(
        &self,
        failures: u32,
        retry_after: Option<Duration>,
        rng: &mut R,
    ) -> Duration {
        let base = self.base_delay(failures);
        let jitter = if self.jitter_ratio > 0.0 {
            base.mul_f64(rng.gen_range(0.0..self.jitter_ratio))
        } else {
            Duration::ZERO
        };
        let delay = base + jitter;
        match retry_after {
            Some(floor) if floor > delay => floor,
            _ => delay,
        }
    }
}
