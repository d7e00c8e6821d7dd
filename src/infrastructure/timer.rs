use crate::types::{DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY};
use std::time::Duration;

/// Retry state for reconnection with exponential backoff.
///
/// The delay before retry `k` (1-based) is `base * 2^(k-1)`. After
/// `max_attempts` retries no further delay is handed out until [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct Timer {
    attempts: u32,
    max_attempts: u32,
    base_delay: u64,
    max_delay: Option<u64>,
}

impl Timer {
    pub fn new(base_delay: u64, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
            max_delay: None,
        }
    }

    /// Caps each individual delay (milliseconds)
    pub fn with_max_delay(mut self, max_delay: Option<u64>) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Get the next delay duration, or `None` once the ceiling is reached
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        let delay = self.delay_for(self.attempts);
        self.attempts += 1;
        Some(delay)
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay = self.base_delay.saturating_mul(factor);
        let delay = match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        };
        Duration::from_millis(delay)
    }

    /// Reset the timer (called on every successful open)
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(DEFAULT_RECONNECT_BASE_DELAY, DEFAULT_MAX_RECONNECT_ATTEMPTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_delays_double_until_ceiling() {
        let mut timer = Timer::default();
        let delays: Vec<u64> = std::iter::from_fn(|| timer.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        assert_eq!(timer.next_delay(), None);
        assert_eq!(timer.attempts(), timer.max_attempts());
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut timer = Timer::default();
        timer.next_delay();
        timer.next_delay();
        timer.next_delay();
        timer.reset();
        assert_eq!(timer.attempts(), 0);
        assert_eq!(timer.next_delay(), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_max_delay_caps_each_step() {
        let mut timer = Timer::new(1000, 6).with_max_delay(Some(5000));
        let delays: Vec<u64> = std::iter::from_fn(|| timer.next_delay())
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 5000, 5000, 5000]);
    }

    #[test]
    fn test_zero_attempts_is_immediately_exhausted() {
        let mut timer = Timer::new(1000, 0);
        assert_eq!(timer.next_delay(), None);
        assert_eq!(timer.attempts(), 0);
    }

    #[test]
    fn test_large_attempt_counts_saturate() {
        let timer = Timer::new(1000, 100);
        assert_eq!(timer.delay_for(70), Duration::from_millis(u64::MAX));
    }
}
