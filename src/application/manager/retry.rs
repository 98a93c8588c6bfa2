//! Exponential backoff for retryable data-access failures.

use std::time::Duration;

use rand::Rng;

use crate::infrastructure::config::ConnectionManagerConfig;

/// Delay schedule between attempts: `base * 2^attempt`, capped, plus an
/// optional random share of that delay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
    jitter_ratio: f64,
}

impl Backoff {
    #[must_use]
    pub fn new(base_ms: u64, max_ms: u64, jitter_ratio: f64) -> Self {
        Self {
            base_ms,
            max_ms: max_ms.max(base_ms),
            jitter_ratio: jitter_ratio.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn from_config(config: &ConnectionManagerConfig) -> Self {
        Self::new(
            config.retry_base_delay_ms,
            config.retry_max_delay_ms,
            config.retry_jitter_ratio,
        )
    }

    /// Deterministic part of the delay before retry number `attempt` (0-based).
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let ms = self.base_ms.saturating_mul(factor).min(self.max_ms);
        Duration::from_millis(ms)
    }

    /// Delay before retry number `attempt`, including jitter.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        base + self.jitter(base)
    }

    fn jitter(&self, base: Duration) -> Duration {
        let range_ms = (base.as_millis() as f64 * self.jitter_ratio) as u64;
        if range_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=range_ms))
    }
}
