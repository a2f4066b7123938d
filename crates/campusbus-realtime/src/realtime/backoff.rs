//! Exponential reconnect backoff with jitter.

use std::time::Duration;

use rand::Rng;

use super::types::ReconnectPolicy;

pub(crate) struct Backoff {
    policy: ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    pub(crate) fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempt: 0 }
    }

    /// Delay before the next attempt, or `None` when the policy is disabled
    /// or its attempts are used up.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if !self.policy.enabled {
            return None;
        }
        if let Some(max) = self.policy.max_attempts {
            if self.attempt >= max {
                return None;
            }
        }

        let ceiling = self
            .policy
            .base_delay
            .saturating_mul(1u32 << self.attempt.min(16))
            .min(self.policy.max_delay);
        self.attempt += 1;
        Some(jitter(ceiling))
    }

    /// Number of attempts handed out since the last reset.
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    pub(crate) fn reset(&mut self) {
        self.attempt = 0;
    }
}

/// Pick a delay uniformly from `[delay / 2, delay]`.
fn jitter(delay: Duration) -> Duration {
    let millis = delay.as_millis() as u64;
    if millis < 2 {
        return delay;
    }
    Duration::from_millis(rand::thread_rng().gen_range(millis / 2..=millis))
}
