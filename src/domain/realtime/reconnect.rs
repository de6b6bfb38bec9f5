//! Bounded exponential backoff for push reconnection.
//!
//! Attempt `n` (1-based) waits `min(base_delay * 2^(n-1), max_delay)`.
//! Once `max_attempts` attempts have been scheduled without an intervening
//! successful connect, no further attempts are made.

use std::time::Duration;

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first attempt.
    ///
    /// Default: 1 second
    pub base_delay: Duration,

    /// Upper bound on any single delay.
    ///
    /// Default: 30 seconds
    pub max_delay: Duration,

    /// Attempts allowed before giving up.
    ///
    /// Default: 10
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            max_attempts: 10,
        }
    }
}

impl ReconnectPolicy {
    /// Delay for the given 1-based attempt number.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

/// Attempt counter for the current outage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconnectState {
    attempts: u32,
}

impl ReconnectState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attempts scheduled since the last successful connect.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Claims the next attempt and returns how long to wait before it.
    ///
    /// Returns `None` once the policy's ceiling has been reached.
    pub fn next_delay(&mut self, policy: &ReconnectPolicy) -> Option<Duration> {
        if self.attempts >= policy.max_attempts {
            return None;
        }
        self.attempts += 1;
        Some(policy.delay_for(self.attempts))
    }

    /// Called on every successful connect.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_policy_matches_console_client() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
        assert_eq!(policy.max_attempts, 10);
    }

    #[test]
    fn delays_double_until_capped() {
        let policy = ReconnectPolicy::default();
        let delays: Vec<u64> = (1..=7)
            .map(|n| policy.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]);
    }

    #[test]
    fn huge_attempt_numbers_saturate_to_max() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.delay_for(u32::MAX), policy.max_delay);
    }

    #[test]
    fn state_stops_after_ceiling() {
        let policy = ReconnectPolicy {
            max_attempts: 3,
            ..Default::default()
        };
        let mut state = ReconnectState::new();

        assert_eq!(state.next_delay(&policy), Some(Duration::from_secs(1)));
        assert_eq!(state.next_delay(&policy), Some(Duration::from_secs(2)));
        assert_eq!(state.next_delay(&policy), Some(Duration::from_secs(4)));
        assert_eq!(state.next_delay(&policy), None);
        assert_eq!(state.attempts(), 3);
    }

    #[test]
    fn reset_restarts_the_sequence() {
        let policy = ReconnectPolicy::default();
        let mut state = ReconnectState::new();
        state.next_delay(&policy);
        state.next_delay(&policy);

        state.reset();

        assert_eq!(state.attempts(), 0);
        assert_eq!(state.next_delay(&policy), Some(policy.base_delay));
    }

    proptest! {
        #[test]
        fn delay_never_exceeds_max(base_ms in 1u64..10_000, max_ms in 1u64..120_000, attempt in 1u32..64) {
            let policy = ReconnectPolicy {
                base_delay: Duration::from_millis(base_ms),
                max_delay: Duration::from_millis(max_ms),
                max_attempts: 10,
            };
            prop_assert!(policy.delay_for(attempt) <= policy.max_delay);
        }

        #[test]
        fn after_n_attempts_next_delay_is_base_times_two_pow_n(prior in 0u32..9) {
            let policy = ReconnectPolicy::default();
            let mut state = ReconnectState::new();
            for _ in 0..prior {
                state.next_delay(&policy);
            }

            let expected = (policy.base_delay.as_millis() as u64)
                .saturating_mul(1u64 << prior)
                .min(policy.max_delay.as_millis() as u64);
            prop_assert_eq!(state.next_delay(&policy), Some(Duration::from_millis(expected)));
        }
    }
}
