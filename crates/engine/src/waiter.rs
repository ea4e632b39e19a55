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

use std::{sync::Arc, time::Duration};

use lander_provider::{LedgerProvider, RelayProvider};
use lander_types::BundleStatus;
use metrics::Counter;
use metrics_derive::Metrics;
use parse_display::Display;
use solana_sdk::signature::Signature;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{confirmation::ChainConfirmationPoller, status::BundleStatusPoller};

/// Settings for waiting on bundle confirmation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfirmationSettings {
    /// Time between polls
    pub poll_interval: Duration,
}

impl Default for ConfirmationSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Which signal reached a terminal state
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
#[display(style = "snake_case")]
pub enum ConfirmationChannel {
    /// The relay's bundle status
    Relay,
    /// Signature statuses on the ledger
    Chain,
}

/// Result of waiting for a bundle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The bundle landed
    Landed {
        /// Landing slot, if reported
        slot: Option<u64>,
        /// Channel that reported it
        channel: ConfirmationChannel,
    },
    /// The bundle or one of its transactions failed
    Failed {
        /// Reported reason
        reason: String,
        /// Channel that reported it
        channel: ConfirmationChannel,
    },
    /// Neither channel reached a terminal state in time
    TimedOut {
        /// Time spent waiting
        elapsed: Duration,
    },
}

impl ConfirmationOutcome {
    /// Whether the bundle landed
    pub fn is_landed(&self) -> bool {
        matches!(self, Self::Landed { .. })
    }

    /// Error text for a non-landed outcome
    pub fn error(&self) -> Option<String> {
        match self {
            Self::Landed { .. } => None,
            Self::Failed { reason, channel } => Some(format!("{channel} reported failure: {reason}")),
            Self::TimedOut { elapsed } => Some(format!(
                "confirmation timed out after {}s",
                elapsed.as_secs()
            )),
        }
    }
}

/// Waits for an accepted bundle to land, polling the relay and the ledger.
///
/// The relay is asked first. Only when it has nothing terminal to say is the
/// ledger checked, since relay tracking can lag behind the ledger or miss
/// bundles entirely.
pub struct ConfirmationWaiter<R, L> {
    relay: BundleStatusPoller<R>,
    chain: ChainConfirmationPoller<L>,
    settings: ConfirmationSettings,
    metrics: WaiterMetrics,
}

impl<R, L> ConfirmationWaiter<R, L>
where
    R: RelayProvider,
    L: LedgerProvider,
{
    /// Create a waiter
    pub fn new(
        relay: BundleStatusPoller<R>,
        chain: ChainConfirmationPoller<L>,
        settings: ConfirmationSettings,
    ) -> Self {
        Self {
            relay,
            chain,
            settings,
            metrics: WaiterMetrics::default(),
        }
    }

    /// Create a waiter directly over providers
    pub fn from_providers(
        relay: Arc<R>,
        ledger: Arc<L>,
        request_timeout: Duration,
        settings: ConfirmationSettings,
    ) -> Self {
        Self::new(
            BundleStatusPoller::new(relay, request_timeout),
            ChainConfirmationPoller::new(ledger, request_timeout),
            settings,
        )
    }

    /// The waiter's settings
    pub fn settings(&self) -> &ConfirmationSettings {
        &self.settings
    }

    /// Wait until `bundle_id` lands or fails, or `timeout` elapses.
    ///
    /// A last poll is made at the deadline before giving up. The deadline also
    /// bounds any poll still in flight, so a slow provider cannot extend the
    /// wait past `timeout`.
    pub async fn wait(
        &self,
        endpoint: &str,
        bundle_id: &str,
        signatures: &[Signature],
        timeout: Duration,
    ) -> ConfirmationOutcome {
        let start = Instant::now();
        let deadline = start + timeout;

        let polled = tokio::time::timeout_at(
            deadline,
            self.poll_until_terminal(endpoint, bundle_id, signatures, deadline),
        )
        .await;

        if let Ok(Some(outcome)) = polled {
            return outcome;
        }
        let elapsed = start.elapsed();
        warn!("Bundle {bundle_id} not confirmed after {elapsed:?}");
        self.metrics.timeouts.increment(1);
        ConfirmationOutcome::TimedOut { elapsed }
    }

    /// Poll both channels until one is terminal. `None` once `deadline` passes.
    async fn poll_until_terminal(
        &self,
        endpoint: &str,
        bundle_id: &str,
        signatures: &[Signature],
        deadline: Instant,
    ) -> Option<ConfirmationOutcome> {
        loop {
            match self.relay.status(endpoint, bundle_id).await {
                BundleStatus::Landed { slot } => {
                    info!("Bundle {bundle_id} landed according to relay, slot {slot:?}");
                    self.metrics.landed_relay.increment(1);
                    return Some(ConfirmationOutcome::Landed {
                        slot,
                        channel: ConfirmationChannel::Relay,
                    });
                }
                BundleStatus::Failed { reason } => {
                    warn!("Bundle {bundle_id} failed according to relay: {reason}");
                    self.metrics.failed.increment(1);
                    return Some(ConfirmationOutcome::Failed {
                        reason,
                        channel: ConfirmationChannel::Relay,
                    });
                }
                BundleStatus::Pending | BundleStatus::Unknown => {}
            }

            match self.chain.status(signatures).await {
                BundleStatus::Landed { slot } => {
                    info!("Bundle {bundle_id} landed according to ledger, slot {slot:?}");
                    self.metrics.landed_chain.increment(1);
                    return Some(ConfirmationOutcome::Landed {
                        slot,
                        channel: ConfirmationChannel::Chain,
                    });
                }
                BundleStatus::Failed { reason } => {
                    warn!("Bundle {bundle_id} failed according to ledger: {reason}");
                    self.metrics.failed.increment(1);
                    return Some(ConfirmationOutcome::Failed {
                        reason,
                        channel: ConfirmationChannel::Chain,
                    });
                }
                status => debug!("Bundle {bundle_id} still {status}"),
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            tokio::time::sleep(self.settings.poll_interval.min(deadline - now)).await;
        }
    }
}

#[derive(Metrics)]
#[metrics(scope = "lander_confirmation")]
struct WaiterMetrics {
    #[metric(describe = "the number of bundles confirmed through the relay.")]
    landed_relay: Counter,
    #[metric(describe = "the number of bundles confirmed directly on the ledger.")]
    landed_chain: Counter,
    #[metric(describe = "the number of bundles reported as failed.")]
    failed: Counter,
    #[metric(describe = "the number of confirmation waits that timed out.")]
    timeouts: Counter,
}

#[cfg(test)]
mod tests {
    use lander_provider::{
        ConfirmationLevel, MockLedgerProvider, MockRelayProvider, ProviderResult,
        RelayBundleStatus, SignatureStatus,
    };
    use lander_types::SignedTransaction;
    use serde_json::json;

    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(60);

    fn waiter(
        relay: MockRelayProvider,
        ledger: MockLedgerProvider,
    ) -> ConfirmationWaiter<MockRelayProvider, MockLedgerProvider> {
        ConfirmationWaiter::from_providers(
            Arc::new(relay),
            Arc::new(ledger),
            Duration::from_secs(5),
            ConfirmationSettings::default(),
        )
    }

    fn relay_status(confirmation: &str, err: serde_json::Value) -> RelayBundleStatus {
        RelayBundleStatus {
            bundle_id: Some("b".into()),
            transactions: vec![],
            slot: Some(77),
            confirmation_status: Some(confirmation.into()),
            err: Some(err),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_landed_skips_chain() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .times(1)
            .returning(|_, _, _| Ok(Some(relay_status("finalized", json!({"Ok": null})))));
        let mut ledger = MockLedgerProvider::new();
        ledger.expect_get_signature_statuses().never();

        let start = Instant::now();
        let outcome = waiter(relay, ledger)
            .wait("http://r", "b", &[Signature::new_unique()], TIMEOUT)
            .await;

        assert_eq!(
            outcome,
            ConfirmationOutcome::Landed {
                slot: Some(77),
                channel: ConfirmationChannel::Relay
            }
        );
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_relay_failed_returns_immediately() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .times(1)
            .returning(|_, _, _| Ok(Some(relay_status("processed", json!({"Err": "dropped"})))));
        let mut ledger = MockLedgerProvider::new();
        ledger.expect_get_signature_statuses().never();

        let outcome = waiter(relay, ledger)
            .wait("http://r", "b", &[Signature::new_unique()], TIMEOUT)
            .await;
        assert!(matches!(
            outcome,
            ConfirmationOutcome::Failed {
                channel: ConfirmationChannel::Relay,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_confirms_while_relay_pending() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .returning(|_, _, _| Ok(None));

        let mut ledger = MockLedgerProvider::new();
        let mut polls = 0;
        ledger
            .expect_get_signature_statuses()
            .returning(move |sigs| {
                polls += 1;
                if polls < 3 {
                    return Ok(vec![None; sigs.len()]);
                }
                Ok(sigs
                    .iter()
                    .map(|_| {
                        Some(SignatureStatus {
                            slot: 500,
                            confirmations: Some(1),
                            err: None,
                            confirmation_status: Some(ConfirmationLevel::Confirmed),
                        })
                    })
                    .collect())
            });

        let start = Instant::now();
        let outcome = waiter(relay, ledger)
            .wait(
                "http://r",
                "b",
                &[Signature::new_unique(), Signature::new_unique()],
                TIMEOUT,
            )
            .await;

        assert_eq!(
            outcome,
            ConfirmationOutcome::Landed {
                slot: Some(500),
                channel: ConfirmationChannel::Chain
            }
        );
        // two sleeps of the poll interval before the third poll
        assert_eq!(start.elapsed(), Duration::from_secs(4));
        assert!(start.elapsed() < TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_nothing_terminal() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .returning(|_, _, _| Ok(None));
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_get_signature_statuses()
            .returning(|sigs| Ok(vec![None; sigs.len()]));

        let timeout = Duration::from_secs(5);
        let outcome = waiter(relay, ledger)
            .wait("http://r", "b", &[Signature::new_unique()], timeout)
            .await;

        assert_eq!(outcome, ConfirmationOutcome::TimedOut { elapsed: timeout });
        assert!(outcome.error().unwrap().contains("timed out"));
    }

    /// Relay whose status call never answers in time
    struct StalledRelay;

    #[async_trait::async_trait]
    impl RelayProvider for StalledRelay {
        async fn send_bundle(
            &self,
            _endpoint: &str,
            _transactions: &[String],
            _timeout: Duration,
        ) -> ProviderResult<String> {
            Ok("b".into())
        }

        async fn get_bundle_status(
            &self,
            _endpoint: &str,
            _bundle_id: &str,
            _timeout: Duration,
        ) -> ProviderResult<Option<RelayBundleStatus>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(None)
        }
    }

    /// Ledger that takes 25s to report every signature as unknown
    struct SlowLedger;

    #[async_trait::async_trait]
    impl LedgerProvider for SlowLedger {
        async fn send_transaction(
            &self,
            tx: &SignedTransaction,
            _config: lander_provider::SendConfig,
        ) -> ProviderResult<Signature> {
            Ok(tx.signature())
        }

        async fn get_signature_statuses(
            &self,
            signatures: &[Signature],
        ) -> ProviderResult<Vec<Option<SignatureStatus>>> {
            tokio::time::sleep(Duration::from_secs(25)).await;
            Ok(vec![None; signatures.len()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_polls_do_not_outlast_timeout() {
        let waiter = ConfirmationWaiter::from_providers(
            Arc::new(StalledRelay),
            Arc::new(SlowLedger),
            Duration::from_secs(30),
            ConfirmationSettings::default(),
        );

        let start = Instant::now();
        let outcome = waiter
            .wait("http://r", "b", &[Signature::new_unique()], TIMEOUT)
            .await;

        assert!(matches!(outcome, ConfirmationOutcome::TimedOut { .. }));
        assert!(start.elapsed() <= TIMEOUT);
        assert_eq!(outcome, ConfirmationOutcome::TimedOut { elapsed: TIMEOUT });
    }
}
