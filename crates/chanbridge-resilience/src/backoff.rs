// SPDX-FileCopyrightText: 2026 Chanbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exponential backoff with jitter.

use std::time::Duration;

use chanbridge_config::model::BackoffConfig;
use rand::Rng;

/// Source of retry delays.
pub trait BackoffPolicy: Send {
    /// Returns the delay to wait before the next attempt and advances the sequence.
    fn next_delay(&mut self) -> Duration;

    /// Restarts the sequence from the initial delay.
    fn reset(&mut self);

    /// Longest delay this policy will ever return.
    fn max_delay(&self) -> Duration;
}

/// Delays grow by `multiplier` from `initial` up to `max`.
///
/// Each returned delay is drawn uniformly from
/// `[base * (1 - factor), base * (1 + factor)]` and then clamped to `max`,
/// where `base` is the un-jittered delay for the current attempt.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial: Duration,
    multiplier: f64,
    max: Duration,
    randomization_factor: f64,
    current: Duration,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, multiplier: f64, max: Duration, randomization_factor: f64) -> Self {
        let initial = initial.min(max);
        Self {
            initial,
            multiplier: if multiplier.is_finite() { multiplier.max(1.0) } else { 1.0 },
            max,
            randomization_factor: randomization_factor.clamp(0.0, 1.0),
            current: initial,
        }
    }

    pub fn from_config(config: &BackoffConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_interval_ms),
            config.multiplier,
            Duration::from_secs(config.max_interval_secs),
            config.randomization_factor,
        )
    }

    /// The un-jittered delay the next call will be centred on.
    pub fn current_base(&self) -> Duration {
        self.current
    }

    fn advance(&mut self) {
        let next = self.current.as_secs_f64() * self.multiplier;
        self.current = if next >= self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(next).max(self.current)
        };
    }

    fn jitter(&self, base: Duration) -> Duration {
        if self.randomization_factor == 0.0 || base.is_zero() {
            return base;
        }
        let base = base.as_secs_f64();
        let delta = base * self.randomization_factor;
        let secs = rand::thread_rng().gen_range((base - delta)..=(base + delta));
        Duration::from_secs_f64(secs.max(0.0)).min(self.max)
    }
}

impl BackoffPolicy for ExponentialBackoff {
    fn next_delay(&mut self) -> Duration {
        let base = self.current;
        self.advance();
        self.jitter(base)
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }

    fn max_delay(&self) -> Duration {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn grows_by_multiplier_until_cap() {
        let mut policy = ExponentialBackoff::new(ms(100), 2.0, ms(1_000), 0.0);
        let delays: Vec<u128> = (0..6).map(|_| policy.next_delay().as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
    }

    #[test]
    fn reset_restarts_sequence() {
        let mut policy = ExponentialBackoff::new(ms(100), 2.0, ms(1_000), 0.0);
        policy.next_delay();
        policy.next_delay();
        policy.reset();
        assert_eq!(policy.next_delay(), ms(100));
    }

    #[test]
    fn defaults_follow_config() {
        let policy = ExponentialBackoff::from_config(&BackoffConfig::default());
        assert_eq!(policy.current_base(), ms(500));
        assert_eq!(policy.max_delay(), Duration::from_secs(60));
    }

    #[test]
    fn jittered_delay_stays_within_band() {
        let mut policy = ExponentialBackoff::new(ms(1_000), 1.0, Duration::from_secs(10), 0.5);
        for _ in 0..64 {
            let d = policy.next_delay();
            assert!(d >= ms(500) && d <= ms(1_500), "delay out of band: {d:?}");
        }
    }

    proptest! {
        /// Without jitter the delay sequence never shrinks and never exceeds the cap.
        #[test]
        fn base_sequence_is_non_decreasing_and_capped(
            initial_ms in 1u64..5_000,
            multiplier in 1.0f64..4.0,
            max_ms in 1u64..120_000,
            steps in 1usize..40,
        ) {
            let max = ms(max_ms);
            let mut policy = ExponentialBackoff::new(ms(initial_ms), multiplier, max, 0.0);
            let mut previous = Duration::ZERO;
            for _ in 0..steps {
                let d = policy.next_delay();
                prop_assert!(d >= previous);
                prop_assert!(d <= max);
                previous = d;
            }
        }

        /// With jitter every delay still respects the cap.
        #[test]
        fn jittered_sequence_respects_cap(factor in 0.0f64..=1.0, steps in 1usize..40) {
            let max = ms(2_000);
            let mut policy = ExponentialBackoff::new(ms(100), 1.5, max, factor);
            for _ in 0..steps {
                prop_assert!(policy.next_delay() <= max);
            }
        }
    }
}
