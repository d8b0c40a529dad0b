use rand::Rng;
use std::time::Duration;

/// Exponential backoff for reconnect loops.
///
/// The delay doubles on every consecutive failure, capped at `max_delay`,
/// with an additive random jitter of up to `jitter_factor` of the capped
/// delay so that many clients do not retry in lockstep.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    base: Duration,
    max_delay: Duration,
    jitter_factor: f64,
    failures: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 0.1)
    }
}

impl ExponentialBackoff {
    /// Create a backoff schedule.
    ///
    /// # Arguments
    /// * `base` - Delay after the first failure
    /// * `max_delay` - Cap on the computed delay
    /// * `jitter_factor` - Additive jitter as a fraction of the capped
    ///   delay (0.0 to 1.0); negative values are clamped to 0
    pub fn new(base: Duration, max_delay: Duration, jitter_factor: f64) -> Self {
        Self {
            base,
            max_delay,
            jitter_factor: jitter_factor.max(0.0),
            failures: 0,
        }
    }

    /// Record a failure and return how long to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let doubled = self.base.saturating_mul(2u32.saturating_pow(self.failures));
        let capped = doubled.min(self.max_delay);

        let jitter_limit = capped.as_secs_f64() * self.jitter_factor;
        let jitter = if jitter_limit > 0.0 {
            rand::thread_rng().gen_range(0.0..=jitter_limit)
        } else {
            0.0
        };

        self.failures = self.failures.saturating_add(1);

        Duration::from_secs_f64(capped.as_secs_f64() + jitter)
    }

    /// Clear the failure count. Call after a successful attempt.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Number of consecutive failures recorded so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_until_capped() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(10), 0.0);

        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(2));
        assert_eq!(backoff.next_delay(), Duration::from_secs(4));
        assert_eq!(backoff.next_delay(), Duration::from_secs(8));
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
        assert_eq!(backoff.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn reset_restarts_the_schedule() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), 0.0);

        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.failures(), 2);

        backoff.reset();
        assert_eq!(backoff.failures(), 0);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(60), 0.2);

        let secs = backoff.next_delay().as_secs_f64();
        assert!((10.0..=12.0).contains(&secs), "delay was {}", secs);
    }

    #[test]
    fn negative_jitter_is_clamped() {
        let mut backoff =
            ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(60), -1.0);

        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }
}
