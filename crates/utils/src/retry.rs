// This file is part of Lander.
//
// Lander is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Lander is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Lander.
// If not, see https://www.gnu.org/licenses/.

//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Options for computing the delay between retries.
///
/// The delay before retry `n` (1-based attempt that just failed) is
/// `base * factor^(n-1)`, scaled by a uniform jitter in
/// `[min_jitter, 1.0]`, then clamped to `[min_delay, max_delay]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffOpts {
    /// Delay after the first failure, before jitter
    pub base: Duration,
    /// Growth factor per attempt
    pub factor: f64,
    /// Lower bound of the jitter multiplier
    pub min_jitter: f64,
    /// Smallest delay ever returned
    pub min_delay: Duration,
    /// Largest delay ever returned
    pub max_delay: Duration,
}

impl Default for BackoffOpts {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 1.5,
            min_jitter: 0.5,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffOpts {
    /// Delay after `attempt` failed, for a given jitter multiplier.
    pub fn delay_with_jitter(&self, attempt: u32, jitter: f64) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base.as_secs_f64() * self.factor.powi(exponent) * jitter;
        let delay = if secs.is_finite() && secs < self.max_delay.as_secs_f64() {
            Duration::from_secs_f64(secs.max(0.0))
        } else {
            self.max_delay
        };
        delay.clamp(self.min_delay, self.max_delay)
    }

    /// Delay after `attempt` failed, drawing the jitter from `rng`.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let jitter = if self.min_jitter < 1.0 {
            rng.gen_range(self.min_jitter..=1.0)
        } else {
            1.0
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Bounds that `delay` can return for `attempt`.
    pub fn bounds(&self, attempt: u32) -> (Duration, Duration) {
        (
            self.delay_with_jitter(attempt, self.min_jitter),
            self.delay_with_jitter(attempt, 1.0),
        )
    }
}
