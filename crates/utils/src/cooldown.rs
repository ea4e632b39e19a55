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

//! Per-source cooldown state.
//!
//! Each logical source (an advisory feed, a relay, ...) owns its own
//! `Cooldown` value and passes it where it is needed. There is no process-wide
//! registry.

use std::time::Duration;

use tokio::time::Instant;

/// Suppresses calls to a source for a period after it failed or rate limited.
#[derive(Clone, Debug)]
pub struct Cooldown {
    source: String,
    period: Duration,
    until: Option<Instant>,
    consecutive_failures: u32,
}

impl Cooldown {
    /// Create an inactive cooldown for `source`.
    pub fn new(source: impl Into<String>, period: Duration) -> Self {
        Self {
            source: source.into(),
            period,
            until: None,
            consecutive_failures: 0,
        }
    }

    /// Name of the source this cooldown guards
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether calls should currently be suppressed.
    pub fn is_active(&self) -> bool {
        self.remaining().is_some()
    }

    /// Time left before the source may be called again.
    pub fn remaining(&self) -> Option<Duration> {
        let until = self.until?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    /// Record a failure. Each consecutive failure doubles the period, up to
    /// eight times the configured one.
    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let multiplier = 1u32 << (self.consecutive_failures - 1).min(3);
        let period = self.period * multiplier;
        tracing::debug!(
            "{} cooling down for {period:?} after {} failure(s)",
            self.source,
            self.consecutive_failures
        );
        self.until = Some(Instant::now() + period);
    }

    /// Record a success, clearing any cooldown.
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
        self.until = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_expires() {
        let mut cooldown = Cooldown::new("tip_floor", Duration::from_secs(10));
        assert!(!cooldown.is_active());

        cooldown.record_failure();
        assert!(cooldown.is_active());
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(!cooldown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_consecutive_failures_extend_period() {
        let mut cooldown = Cooldown::new("tip_floor", Duration::from_secs(10));
        cooldown.record_failure();
        cooldown.record_failure();
        assert_eq!(cooldown.remaining(), Some(Duration::from_secs(20)));

        for _ in 0..10 {
            cooldown.record_failure();
        }
        assert_eq!(cooldown.remaining(), Some(Duration::from_secs(80)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets() {
        let mut cooldown = Cooldown::new("tip_floor", Duration::from_secs(10));
        cooldown.record_failure();
        cooldown.record_success();
        assert!(!cooldown.is_active());
        cooldown.record_failure();
        assert_eq!(cooldown.remaining(), Some(Duration::from_secs(10)));
    }
}
