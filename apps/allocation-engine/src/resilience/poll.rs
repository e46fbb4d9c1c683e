//! Bounded polling for an eventually-consistent remote system.
//!
//! The ERP gives no notification when stock settles after a receipt flag
//! changes, so reads that come back empty are repeated on a schedule.
//!
//! # Example
//!
//! ```rust,ignore
//! use allocation_engine::resilience::{PollBackoff, PollPolicy};
//! use std::time::Duration;
//!
//! let policy = PollPolicy::fixed(3, Duration::from_secs(3));
//! let mut backoff = PollBackoff::new(&policy);
//!
//! while let Some(delay) = backoff.next_delay() {
//!     tokio::time::sleep(delay).await;
//!     // re-read ...
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Polling schedule: how many extra reads and how far apart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Re-reads after the first one (default: 3).
    pub max_retries: u32,
    /// Delay before the first re-read (default: 3s).
    pub interval: Duration,
    /// Upper bound for any single delay (default: 30s).
    pub max_interval: Duration,
    /// Growth factor between delays; 1.0 keeps them fixed (default: 1.0).
    pub multiplier: f64,
    /// Jitter factor for randomization (default: 0.0).
    pub jitter_factor: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(3, Duration::from_secs(3))
    }
}

impl PollPolicy {
    /// Evenly spaced re-reads.
    #[must_use]
    pub const fn fixed(max_retries: u32, interval: Duration) -> Self {
        Self {
            max_retries,
            interval,
            max_interval: Duration::from_secs(30),
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Exponentially spaced re-reads, capped at `max_interval`.
    #[must_use]
    pub const fn exponential(
        max_retries: u32,
        interval: Duration,
        max_interval: Duration,
        multiplier: f64,
    ) -> Self {
        Self {
            max_retries,
            interval,
            max_interval,
            multiplier,
            jitter_factor: 0.0,
        }
    }

    /// Re-reads with no delay between them. Used by tests.
    #[must_use]
    pub const fn immediate(max_retries: u32) -> Self {
        Self::fixed(max_retries, Duration::ZERO)
    }

    /// Set the jitter factor.
    #[must_use]
    pub const fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }
}

/// Iterator-like delay calculator for one polling run.
#[derive(Debug)]
pub struct PollBackoff {
    current_attempt: u32,
    max_retries: u32,
    interval_ms: u64,
    max_interval_ms: u64,
    multiplier: f64,
    jitter_factor: f64,
}

impl PollBackoff {
    /// Start a polling run from a policy.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn new(policy: &PollPolicy) -> Self {
        Self {
            current_attempt: 0,
            max_retries: policy.max_retries,
            interval_ms: policy.interval.as_millis() as u64,
            max_interval_ms: policy.max_interval.as_millis() as u64,
            multiplier: policy.multiplier,
            jitter_factor: policy.jitter_factor,
        }
    }

    /// Delay before the next re-read, or `None` once retries are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.current_attempt >= self.max_retries {
            return None;
        }

        let base_ms = self.base_delay_ms();
        let jittered_ms = self.apply_jitter(base_ms).min(self.max_interval_ms);

        self.current_attempt += 1;

        Some(Duration::from_millis(jittered_ms))
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap
    )]
    fn base_delay_ms(&self) -> u64 {
        let factor = self.multiplier.max(1.0).powi(self.current_attempt as i32);
        let delay = (self.interval_ms as f64 * factor) as u64;
        delay.min(self.max_interval_ms)
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn apply_jitter(&self, delay_ms: u64) -> u64 {
        if self.jitter_factor <= 0.0 || delay_ms == 0 {
            return delay_ms;
        }
        let mut rng = rand::rng();
        let range = delay_ms as f64 * self.jitter_factor;
        let min = (delay_ms as f64 - range).max(0.0);
        let max = delay_ms as f64 + range;
        rng.random_range(min..=max) as u64
    }

    /// Re-reads performed so far.
    #[must_use]
    pub const fn current_attempt(&self) -> u32 {
        self.current_attempt
    }
}
