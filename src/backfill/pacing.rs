//! Request pacing between windows
//!
//! The backfill respects the API quota by running strictly sequentially and
//! waiting `base_delay + jitter` after each window. Jitter keeps repeated
//! runs from hitting the API in lockstep.

use rand::Rng;
use std::time::Duration;

/// Base inter-request delay.
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_secs(3);

/// Lower bound of the random jitter.
pub const DEFAULT_JITTER_MIN: Duration = Duration::from_millis(500);

/// Upper bound of the random jitter.
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(1500);

/// Delay applied after every processed window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Fixed part of the delay
    pub base_delay: Duration,
    /// Smallest random addition
    pub jitter_min: Duration,
    /// Largest random addition (exclusive)
    pub jitter_max: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_REQUEST_DELAY,
            jitter_min: DEFAULT_JITTER_MIN,
            jitter_max: DEFAULT_JITTER_MAX,
        }
    }
}

impl Pacing {
    /// Pacing with a fixed delay and no jitter.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            jitter_min: Duration::ZERO,
            jitter_max: Duration::ZERO,
        }
    }

    /// Draw the next delay from the thread-local RNG.
    pub fn next_delay(&self) -> Duration {
        self.next_delay_with(&mut rand::thread_rng())
    }

    /// Draw the next delay from `rng`.
    pub fn next_delay_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.jitter_max <= self.jitter_min {
            return self.base_delay + self.jitter_min;
        }
        let jitter = rng.gen_range(self.jitter_min.as_secs_f64()..self.jitter_max.as_secs_f64());
        self.base_delay + Duration::from_secs_f64(jitter)
    }
}
