use std::time::Duration;

/// Retry/backoff configuration for the communicator.
///
/// Delay between attempts doubles starting at `base_delay`, capped at
/// `max_delay`. `max_attempts` counts the first attempt, so `max_attempts =
/// 3` means up to two retries after an initial failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// Delay to wait before the attempt numbered `attempt` (1-indexed: the
    /// delay before the *second* attempt is `delay_before(2)`).
    ///
    /// `delay_before(1)` is always zero — the first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let exponent = attempt - 2;
        let multiplier = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
        let scaled = self.base_delay.saturating_mul(multiplier as u32);
        scaled.min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(10))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_never_waits() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
    }

    #[test]
    fn delay_doubles_until_capped() {
        let policy = RetryPolicy::new(6, Duration::from_secs(1), Duration::from_secs(10));
        let delays: Vec<Duration> = (1..=6).map(|a| policy.delay_before(a)).collect();
        assert_eq!(
            delays,
            vec![
                Duration::ZERO,
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8),
                Duration::from_secs(10), // capped, would otherwise be 16
            ]
        );
    }

    #[test]
    fn delays_are_monotonically_non_decreasing() {
        let policy = RetryPolicy::default();
        let mut prev = Duration::ZERO;
        for attempt in 1..=policy.max_attempts {
            let delay = policy.delay_before(attempt);
            assert!(delay >= prev);
            prev = delay;
        }
    }

    #[test]
    fn max_attempts_is_at_least_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1), Duration::from_secs(10));
        assert_eq!(policy.max_attempts, 1);
    }
}
