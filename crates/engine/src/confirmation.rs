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

use lander_provider::{LedgerProvider, ProviderError};
use lander_types::BundleStatus;
use solana_sdk::signature::Signature;
use tracing::warn;

/// Checks bundle transactions directly on the ledger, independent of any
/// relay.
pub struct ChainConfirmationPoller<L> {
    ledger: Arc<L>,
    request_timeout: Duration,
}

impl<L> ChainConfirmationPoller<L>
where
    L: LedgerProvider,
{
    /// Create a poller
    pub fn new(ledger: Arc<L>, request_timeout: Duration) -> Self {
        Self {
            ledger,
            request_timeout,
        }
    }

    /// Aggregate status of `signatures`.
    ///
    /// Landed once every signature is confirmed or finalized, at the highest
    /// reported slot. Failed as soon as any signature reports an error.
    pub async fn status(&self, signatures: &[Signature]) -> BundleStatus {
        if signatures.is_empty() {
            return BundleStatus::Unknown;
        }

        let result = tokio::time::timeout(
            self.request_timeout,
            self.ledger.get_signature_statuses(signatures),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        let statuses = match result {
            Ok(statuses) => statuses,
            Err(err) => {
                warn!("Failed to query signature statuses: {err}");
                return BundleStatus::Unknown;
            }
        };

        let mut all_confirmed = true;
        let mut slot = None;
        for (signature, status) in signatures.iter().zip(&statuses) {
            let Some(status) = status else {
                all_confirmed = false;
                continue;
            };
            if let Some(err) = status.error() {
                return BundleStatus::Failed {
                    reason: format!("transaction {signature} failed: {err}"),
                };
            }
            if status.is_confirmed() {
                slot = slot.max(Some(status.slot));
            } else {
                all_confirmed = false;
            }
        }

        if all_confirmed && statuses.len() == signatures.len() {
            BundleStatus::Landed { slot }
        } else {
            BundleStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use lander_provider::{ConfirmationLevel, MockLedgerProvider, SignatureStatus};
    use serde_json::json;

    use super::*;

    fn status(slot: u64, level: ConfirmationLevel) -> Option<SignatureStatus> {
        Some(SignatureStatus {
            slot,
            confirmations: None,
            err: None,
            confirmation_status: Some(level),
        })
    }

    fn ledger_poller(statuses: Vec<Option<SignatureStatus>>) -> ChainConfirmationPoller<MockLedgerProvider> {
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_get_signature_statuses()
            .returning(move |_| Ok(statuses.clone()));
        ChainConfirmationPoller::new(Arc::new(ledger), Duration::from_secs(1))
    }

    fn sigs(n: usize) -> Vec<Signature> {
        (0..n).map(|_| Signature::new_unique()).collect()
    }

    #[tokio::test]
    async fn test_all_confirmed_lands_at_max_slot() {
        let poller = ledger_poller(vec![
            status(100, ConfirmationLevel::Confirmed),
            status(102, ConfirmationLevel::Finalized),
        ]);
        assert_eq!(
            poller.status(&sigs(2)).await,
            BundleStatus::Landed { slot: Some(102) }
        );
    }

    #[tokio::test]
    async fn test_partial_is_pending() {
        let poller = ledger_poller(vec![status(100, ConfirmationLevel::Confirmed), None]);
        assert_eq!(poller.status(&sigs(2)).await, BundleStatus::Pending);

        let poller = ledger_poller(vec![status(100, ConfirmationLevel::Processed)]);
        assert_eq!(poller.status(&sigs(1)).await, BundleStatus::Pending);
    }

    #[tokio::test]
    async fn test_any_error_fails() {
        let mut failed = status(101, ConfirmationLevel::Processed);
        if let Some(s) = failed.as_mut() {
            s.err = Some(json!({"InstructionError": [0, {"Custom": 1}]}));
        }
        let poller = ledger_poller(vec![None, failed]);
        assert!(matches!(
            poller.status(&sigs(2)).await,
            BundleStatus::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn test_query_failure_is_unknown() {
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_get_signature_statuses()
            .returning(|_| Err(ProviderError::Timeout));
        let poller = ChainConfirmationPoller::new(Arc::new(ledger), Duration::from_secs(1));
        assert_eq!(poller.status(&sigs(1)).await, BundleStatus::Unknown);
    }

    #[tokio::test]
    async fn test_no_signatures_is_unknown() {
        let ledger = MockLedgerProvider::new();
        let poller = ChainConfirmationPoller::new(Arc::new(ledger), Duration::from_secs(1));
        assert_eq!(poller.status(&[]).await, BundleStatus::Unknown);
    }
}
