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

use lander_provider::{LedgerProvider, ProviderError, SendConfig};
use lander_types::{SignedTransaction, TransactionFailure};
use metrics::Counter;
use metrics_derive::Metrics;
use solana_sdk::signature::Signature;
use tokio::{sync::broadcast, time::Instant};
use tracing::{debug, info, warn};

use crate::{classify::is_already_processed, emit::ExecutionEvent};

/// Settings for sequential submission
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FallbackSettings {
    /// Pause between consecutive sends
    pub send_delay: Duration,
    /// Options passed to the ledger with each send
    pub send_config: SendConfig,
    /// How long to wait for each transaction to confirm
    pub confirm_timeout: Duration,
    /// Time between confirmation polls
    pub confirm_poll_interval: Duration,
    /// Timeout of each individual request
    pub request_timeout: Duration,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            send_delay: Duration::from_millis(400),
            send_config: SendConfig::default(),
            confirm_timeout: Duration::from_secs(30),
            confirm_poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of sending transactions one by one
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FallbackOutcome {
    /// True only if no transaction failed
    pub success: bool,
    /// Signatures of confirmed transactions, in input order
    pub signatures: Vec<Signature>,
    /// Every transaction that failed
    pub failures: Vec<TransactionFailure>,
}

impl FallbackOutcome {
    /// Failures joined into a single line
    pub fn error_summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(|f| format!("tx {}: {}", f.index, f.reason))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Sends transactions individually through the ledger RPC, in order.
///
/// This path is not atomic. A failed transaction does not stop the ones after
/// it: each is sent and confirmed on its own and its failure recorded.
pub struct SequentialFallbackExecutor<L> {
    ledger: Arc<L>,
    settings: FallbackSettings,
    event_sender: Option<broadcast::Sender<ExecutionEvent>>,
    metrics: FallbackMetrics,
}

impl<L> SequentialFallbackExecutor<L>
where
    L: LedgerProvider,
{
    /// Create an executor
    pub fn new(ledger: Arc<L>, settings: FallbackSettings) -> Self {
        Self {
            ledger,
            settings,
            event_sender: None,
            metrics: FallbackMetrics::default(),
        }
    }

    /// Emit per-transaction events to `sender`
    pub fn with_event_sender(mut self, sender: broadcast::Sender<ExecutionEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Send and confirm each transaction in turn.
    pub async fn execute(&self, transactions: &[SignedTransaction]) -> FallbackOutcome {
        let mut outcome = FallbackOutcome::default();

        for (index, tx) in transactions.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.settings.send_delay).await;
            }

            match self.send_and_confirm(tx).await {
                Ok(signature) => {
                    info!("Transaction {index} confirmed: {signature}");
                    self.metrics.confirmed.increment(1);
                    self.emit(ExecutionEvent::FallbackTransactionConfirmed { index, signature });
                    outcome.signatures.push(signature);
                }
                Err(reason) => {
                    warn!("Transaction {index} ({}) failed: {reason}", tx.signature());
                    self.metrics.failed.increment(1);
                    self.emit(ExecutionEvent::FallbackTransactionFailed {
                        index,
                        signature: tx.signature(),
                        reason: reason.clone(),
                    });
                    outcome.failures.push(TransactionFailure {
                        index,
                        signature: tx.signature(),
                        reason,
                    });
                }
            }
        }

        outcome.success = outcome.failures.is_empty();
        outcome
    }

    async fn send_and_confirm(&self, tx: &SignedTransaction) -> Result<Signature, String> {
        self.metrics.sent.increment(1);
        let sent = tokio::time::timeout(
            self.settings.request_timeout,
            self.ledger.send_transaction(tx, self.settings.send_config),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        let signature = match sent {
            Ok(signature) => signature,
            Err(err) if is_already_processed(&err.message()) => {
                debug!("Transaction {} already processed", tx.signature());
                tx.signature()
            }
            Err(err) => return Err(format!("send failed: {err}")),
        };

        self.confirm(signature).await
    }

    async fn confirm(&self, signature: Signature) -> Result<Signature, String> {
        let deadline = Instant::now() + self.settings.confirm_timeout;
        tokio::time::timeout_at(deadline, self.poll_confirmation(signature, deadline))
            .await
            .unwrap_or_else(|_| Err(self.unconfirmed()))
    }

    async fn poll_confirmation(
        &self,
        signature: Signature,
        deadline: Instant,
    ) -> Result<Signature, String> {
        loop {
            let result = tokio::time::timeout(
                self.settings.request_timeout,
                self.ledger.get_signature_statuses(&[signature]),
            )
            .await
            .unwrap_or(Err(ProviderError::Timeout));

            match result {
                Ok(statuses) => match statuses.into_iter().next().flatten() {
                    Some(status) => {
                        if let Some(err) = status.error() {
                            return Err(format!("transaction error: {err}"));
                        }
                        if status.is_confirmed() {
                            return Ok(signature);
                        }
                    }
                    None => debug!("Transaction {signature} not yet seen"),
                },
                Err(err) => warn!("Failed to query status of {signature}: {err}"),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.unconfirmed());
            }
            tokio::time::sleep(self.settings.confirm_poll_interval.min(deadline - now)).await;
        }
    }

    fn unconfirmed(&self) -> String {
        format!(
            "not confirmed within {}s",
            self.settings.confirm_timeout.as_secs()
        )
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

#[derive(Metrics)]
#[metrics(scope = "lander_fallback")]
struct FallbackMetrics {
    #[metric(describe = "the number of transactions sent individually.")]
    sent: Counter,
    #[metric(describe = "the number of individually sent transactions that confirmed.")]
    confirmed: Counter,
    #[metric(describe = "the number of individually sent transactions that failed.")]
    failed: Counter,
}

#[cfg(test)]
mod tests {
    use lander_provider::{ConfirmationLevel, MockLedgerProvider, SignatureStatus};
    use lander_utils::json_rpc::JsonRpcError;
    use mockall::Sequence;
    use serde_json::json;

    use super::*;

    fn txs(n: usize) -> Vec<SignedTransaction> {
        (0..n)
            .map(|i| SignedTransaction::new(vec![i as u8; 8], Signature::new_unique()))
            .collect()
    }

    fn confirmed(slot: u64) -> Vec<Option<SignatureStatus>> {
        vec![Some(SignatureStatus {
            slot,
            confirmations: None,
            err: None,
            confirmation_status: Some(ConfirmationLevel::Finalized),
        })]
    }

    fn executor(ledger: MockLedgerProvider) -> SequentialFallbackExecutor<MockLedgerProvider> {
        SequentialFallbackExecutor::new(Arc::new(ledger), FallbackSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_confirm_in_order() {
        let txs = txs(3);
        let mut ledger = MockLedgerProvider::new();
        let mut seq = Sequence::new();
        for tx in &txs {
            let expected = tx.signature();
            ledger
                .expect_send_transaction()
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |tx, _| {
                    assert_eq!(tx.signature(), expected);
                    Ok(expected)
                });
            ledger
                .expect_get_signature_statuses()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(confirmed(9)));
        }

        let start = Instant::now();
        let outcome = executor(ledger).execute(&txs).await;

        assert!(outcome.success);
        assert_eq!(
            outcome.signatures,
            txs.iter().map(|t| t.signature()).collect::<Vec<_>>()
        );
        assert!(outcome.failures.is_empty());
        // a send delay between each pair of sends
        assert_eq!(start.elapsed(), Duration::from_millis(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_abort_rest() {
        let txs = txs(3);
        let failing = txs[1].signature();

        let mut ledger = MockLedgerProvider::new();
        ledger.expect_send_transaction().times(3).returning(move |tx, _| {
            if tx.signature() == failing {
                Err(ProviderError::Rpc(JsonRpcError {
                    code: -32002,
                    message: "Transaction simulation failed: insufficient funds".into(),
                    data: None,
                }))
            } else {
                Ok(tx.signature())
            }
        });
        ledger
            .expect_get_signature_statuses()
            .times(2)
            .returning(|_| Ok(confirmed(5)));

        let outcome = executor(ledger).execute(&txs).await;

        assert!(!outcome.success);
        assert_eq!(outcome.signatures, vec![txs[0].signature(), txs[2].signature()]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[0].signature, failing);
        assert!(outcome.error_summary().unwrap().starts_with("tx 1:"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execution_error_recorded() {
        let txs = txs(1);
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_send_transaction()
            .returning(|tx, _| Ok(tx.signature()));
        ledger.expect_get_signature_statuses().returning(|_| {
            Ok(vec![Some(SignatureStatus {
                slot: 3,
                confirmations: Some(0),
                err: Some(json!({"InstructionError": [0, "InvalidAccountData"]})),
                confirmation_status: Some(ConfirmationLevel::Processed),
            })])
        });

        let outcome = executor(ledger).execute(&txs).await;
        assert!(!outcome.success);
        assert!(outcome.failures[0].reason.contains("InvalidAccountData"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_processed_counts_as_sent() {
        let txs = txs(1);
        let mut ledger = MockLedgerProvider::new();
        ledger.expect_send_transaction().returning(|_, _| {
            Err(ProviderError::Rpc(JsonRpcError {
                code: -32002,
                message: "This transaction has already been processed".into(),
                data: None,
            }))
        });
        ledger
            .expect_get_signature_statuses()
            .returning(|_| Ok(confirmed(4)));

        let outcome = executor(ledger).execute(&txs).await;
        assert!(outcome.success);
        assert_eq!(outcome.signatures, vec![txs[0].signature()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_timeout() {
        let txs = txs(1);
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_send_transaction()
            .returning(|tx, _| Ok(tx.signature()));
        ledger
            .expect_get_signature_statuses()
            .returning(|_| Ok(vec![None]));

        let start = Instant::now();
        let outcome = executor(ledger).execute(&txs).await;

        assert!(!outcome.success);
        assert!(outcome.failures[0].reason.contains("not confirmed"));
        assert_eq!(start.elapsed(), FallbackSettings::default().confirm_timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_emits_per_transaction_events() {
        let txs = txs(2);
        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_send_transaction()
            .returning(|tx, _| Ok(tx.signature()));
        ledger
            .expect_get_signature_statuses()
            .returning(|_| Ok(confirmed(1)));

        let (tx, mut rx) = broadcast::channel(16);
        executor(ledger).with_event_sender(tx).execute(&txs).await;

        for (index, t) in txs.iter().enumerate() {
            assert_eq!(
                rx.recv().await.unwrap(),
                ExecutionEvent::FallbackTransactionConfirmed {
                    index,
                    signature: t.signature()
                }
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_fails_on_chain_third_still_sent() {
        let txs = txs(3);
        let failing = txs[1].signature();

        let mut ledger = MockLedgerProvider::new();
        ledger
            .expect_send_transaction()
            .times(3)
            .returning(|tx, _| Ok(tx.signature()));
        ledger
            .expect_get_signature_statuses()
            .times(3)
            .returning(move |sigs| {
                if sigs[0] == failing {
                    Ok(vec![Some(SignatureStatus {
                        slot: 6,
                        confirmations: None,
                        err: Some(json!({"InstructionError": [1, {"Custom": 6001}]})),
                        confirmation_status: Some(ConfirmationLevel::Confirmed),
                    })])
                } else {
                    Ok(confirmed(6))
                }
            });

        let outcome = executor(ledger).execute(&txs).await;

        assert!(!outcome.success);
        assert_eq!(outcome.signatures, vec![txs[0].signature(), txs[2].signature()]);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].index, 1);
        assert_eq!(outcome.failures[0].signature, failing);
        assert!(outcome.failures[0].reason.starts_with("transaction error"));
    }

    /// Ledger that sends at once but answers status queries after 25s
    struct SlowStatusLedger;

    #[async_trait::async_trait]
    impl LedgerProvider for SlowStatusLedger {
        async fn send_transaction(
            &self,
            tx: &SignedTransaction,
            _config: SendConfig,
        ) -> lander_provider::ProviderResult<Signature> {
            Ok(tx.signature())
        }

        async fn get_signature_statuses(
            &self,
            signatures: &[Signature],
        ) -> lander_provider::ProviderResult<Vec<Option<SignatureStatus>>> {
            tokio::time::sleep(Duration::from_secs(25)).await;
            Ok(vec![None; signatures.len()])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_status_does_not_outlast_confirm_timeout() {
        let settings = FallbackSettings::default();
        let executor = SequentialFallbackExecutor::new(Arc::new(SlowStatusLedger), settings);

        let start = Instant::now();
        let outcome = executor.execute(&txs(1)).await;

        assert!(!outcome.success);
        assert!(outcome.failures[0].reason.contains("not confirmed"));
        assert_eq!(start.elapsed(), settings.confirm_timeout);
    }
}
