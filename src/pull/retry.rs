use std::time::Duration;

/// Bounded exponential backoff for transient transport failures.
///
/// The default allows no retries at all: the first failure ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed per batch, not counting the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound on a single backoff.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based), or `None` once the budget is spent.
    pub fn delay_for(&self, retry: u32) -> Option<Duration> {
        if retry == 0 || retry > self.max_retries {
            return None;
        }
        let factor = 1u32 << (retry - 1).min(16);
        Some(self.base_delay.saturating_mul(factor).min(self.max_delay))
    }
}
