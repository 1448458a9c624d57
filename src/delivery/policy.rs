//! Poll policy: how long and how often to re-issue a request whose result is
//! still being computed.

use std::time::Duration;

use rand::Rng;

/// Delay schedule between poll attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Same interval every time.
    Fixed(Duration),
    /// `initial * multiplier^n`, capped at `max`.
    Exponential {
        initial: Duration,
        multiplier: f64,
        max: Duration,
    },
}

/// Polling budget for one logical fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Total requests allowed, the first one included.
    pub max_attempts: u32,
    pub backoff: Backoff,
    /// Wall-clock budget for the whole fetch, waits included.
    pub time_budget: Duration,
    pub use_jitter: bool,
    /// Maximum jitter as a fraction of the delay (0.0 to 1.0).
    pub jitter_factor: f64,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Backoff::Exponential {
                initial: Duration::from_secs(1),
                multiplier: 2.0,
                max: Duration::from_secs(16),
            },
            time_budget: Duration::from_secs(120),
            use_jitter: false,
            jitter_factor: 0.1,
        }
    }
}

impl PollPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed-interval policy.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            backoff: Backoff::Fixed(interval),
            ..Self::default()
        }
    }

    /// Exponential policy with a cap.
    pub fn exponential(initial: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            backoff: Backoff::Exponential {
                initial,
                multiplier,
                max,
            },
            ..Self::default()
        }
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = budget;
        self
    }

    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    /// Clamped to `0.0..=1.0`; NaN disables jitter.
    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = if factor.is_nan() {
            0.0
        } else {
            factor.clamp(0.0, 1.0)
        };
        self
    }

    /// Wait before attempt `attempt + 1`, where `attempt` counts completed
    /// intermediate responses starting at 0.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let delay = match self.backoff {
            Backoff::Fixed(interval) => interval,
            Backoff::Exponential {
                initial,
                multiplier,
                max,
            } => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let millis = initial.as_millis() as f64 * multiplier.powi(exponent);
                if millis.is_finite() && millis < max.as_millis() as f64 {
                    Duration::from_millis(millis as u64)
                } else {
                    max
                }
            }
        };

        if self.use_jitter {
            self.add_jitter(delay)
        } else {
            delay
        }
    }

    fn add_jitter(&self, delay: Duration) -> Duration {
        let range = delay.as_millis() as f64 * self.jitter_factor;
        if !(range.is_finite() && range > 0.0) {
            return delay;
        }
        let jitter = rand::thread_rng().gen_range(-range..=range);
        Duration::from_millis((delay.as_millis() as f64 + jitter).max(0.0) as u64)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".into());
        }
        if self.time_budget.is_zero() {
            return Err("time_budget must be positive".into());
        }
        if !(self.jitter_factor.is_finite() && (0.0..=1.0).contains(&self.jitter_factor)) {
            return Err(format!(
                "jitter_factor must be between 0 and 1, got {}",
                self.jitter_factor
            ));
        }
        if let Backoff::Exponential { multiplier, .. } = self.backoff {
            if !(multiplier.is_finite() && multiplier >= 1.0) {
                return Err(format!("backoff multiplier must be >= 1, got {multiplier}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_delays_are_capped() {
        let policy = PollPolicy::default();
        let secs: Vec<u64> = (0..7).map(|n| policy.delay_for(n).as_secs()).collect();
        assert_eq!(secs, vec![1, 2, 4, 8, 16, 16, 16]);
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(16));
    }

    #[test]
    fn fixed_delay() {
        let policy = PollPolicy::fixed(Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(9), Duration::from_millis(250));
    }

    #[test]
    fn jitter_stays_within_factor() {
        let policy = PollPolicy::fixed(Duration::from_millis(1000))
            .with_jitter(true)
            .with_jitter_factor(0.2);
        for n in 0..50 {
            let ms = policy.delay_for(n).as_millis();
            assert!((800..=1200).contains(&ms), "{ms}");
        }
    }

    #[test]
    fn nan_jitter_factor_never_panics() {
        let built = PollPolicy::fixed(Duration::from_millis(100))
            .with_jitter(true)
            .with_jitter_factor(f64::NAN);
        assert_eq!(built.jitter_factor, 0.0);
        assert_eq!(built.delay_for(0), Duration::from_millis(100));

        let mut direct = PollPolicy::fixed(Duration::from_millis(100)).with_jitter(true);
        direct.jitter_factor = f64::NAN;
        assert_eq!(direct.delay_for(0), Duration::from_millis(100));
        direct.jitter_factor = f64::INFINITY;
        assert_eq!(direct.delay_for(0), Duration::from_millis(100));
    }

    #[test]
    fn huge_delays_keep_their_value() {
        let policy = PollPolicy::fixed(Duration::MAX).with_time_budget(Duration::MAX);
        assert_eq!(policy.delay_for(3), Duration::MAX);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn validation() {
        assert!(PollPolicy::default().validate().is_ok());
        assert!(PollPolicy::default().with_max_attempts(0).validate().is_err());
        assert!(
            PollPolicy::exponential(Duration::from_secs(1), 0.5, Duration::from_secs(4))
                .validate()
                .is_err()
        );
        for factor in [f64::NAN, f64::INFINITY, -0.5, 1.5] {
            let mut policy = PollPolicy::default();
            policy.jitter_factor = factor;
            assert!(policy.validate().is_err(), "{factor}");
        }
    }
}
