//! Exponential reconnect backoff with jitter and an attempt ceiling.
//!
//! ```rust
//! use std::time::Duration;
//!
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use wsession::{ReconnectDecision, ReconnectPolicy, ReconnectState};
//!
//! let policy = ReconnectPolicy::default();
//! assert_eq!(policy.backoff_for_attempt(3), Duration::from_secs(4));
//!
//! let mut rng = StdRng::seed_from_u64(7);
//! let mut state = ReconnectState::default();
//! match state.record_failure(&policy, policy.max_attempts, &mut rng) {
//!     ReconnectDecision::Retry { attempt, delay } => {
//!         assert_eq!(attempt, 1);
//!         assert!(delay >= Duration::from_millis(900) && delay <= Duration::from_millis(1100));
//!     }
//!     ReconnectDecision::Exhausted { .. } => unreachable!(),
//! }
//! ```

use std::time::Duration;

use rand::Rng;

use crate::ConfigError;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectPolicy {
    pub base_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub max_attempts: u32,
    /// Fraction of the computed delay used as a symmetric random band.
    pub jitter: f64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            factor: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: 5,
            jitter: 0.1,
        }
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_delay.is_zero() {
            return Err(ConfigError::invalid_reconnect_policy(
                "base delay must be greater than zero",
            ));
        }

        if !self.factor.is_finite() || self.factor < 1.0 {
            return Err(ConfigError::invalid_reconnect_policy(format!(
                "backoff factor must be at least 1.0, got {}",
                self.factor
            )));
        }

        if self.max_delay < self.base_delay {
            return Err(ConfigError::invalid_reconnect_policy(
                "max delay must not be shorter than the base delay",
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::invalid_reconnect_policy(format!(
                "jitter must be within 0.0..=1.0, got {}",
                self.jitter
            )));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::invalid_reconnect_policy(
                "max attempts must be at least one",
            ));
        }

        Ok(())
    }

    /// Un-jittered delay for a 1-based `attempt`.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let unbounded = self.base_delay.as_secs_f64() * self.factor.powi(exponent);
        Duration::from_secs_f64(unbounded.min(self.max_delay.as_secs_f64()))
    }

    pub fn jitter_band(&self, attempt: u32) -> (Duration, Duration) {
        let center = self.backoff_for_attempt(attempt).as_secs_f64();
        let jitter = self.jitter.max(0.0);
        let upper = (center * (1.0 + jitter)).min(self.max_delay.as_secs_f64());
        (
            Duration::from_secs_f64((center * (1.0 - jitter)).max(0.0)),
            Duration::from_secs_f64(upper),
        )
    }

    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.next_delay_with(attempt, &mut rand::thread_rng())
    }

    /// Jittered delay drawn from `rng`, never above `max_delay`.
    pub fn next_delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let center = self.backoff_for_attempt(attempt).as_secs_f64();
        if self.jitter <= 0.0 {
            return Duration::from_secs_f64(center);
        }

        let offset = rng.gen_range(-self.jitter..=self.jitter);
        let jittered = (center * (1.0 + offset))
            .max(0.0)
            .min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(jittered)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    Retry { attempt: u32, delay: Duration },
    Exhausted { attempts: u32 },
}

/// Consecutive failed connection cycles since the last healthy session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconnectState {
    attempts: u32,
    last_delay: Option<Duration>,
}

impl ReconnectState {
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.last_delay
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.last_delay = None;
    }

    /// Counts one failed cycle against `ceiling`.
    pub fn record_failure<R: Rng + ?Sized>(
        &mut self,
        policy: &ReconnectPolicy,
        ceiling: u32,
        rng: &mut R,
    ) -> ReconnectDecision {
        let attempt = self.attempts.saturating_add(1);
        if attempt > ceiling {
            return ReconnectDecision::Exhausted {
                attempts: self.attempts,
            };
        }

        let delay = policy.next_delay_with(attempt, rng);
        self.attempts = attempt;
        self.last_delay = Some(delay);
        ReconnectDecision::Retry { attempt, delay }
    }
}
