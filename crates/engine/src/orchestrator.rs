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
use lander_types::{Bundle, BundleError, ExecutionResult, SignedTransaction};
use metrics::Counter;
use metrics_derive::Metrics;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::{
    emit::ExecutionEvent,
    endpoint_pool::RelayEndpointPool,
    fallback::{FallbackSettings, SequentialFallbackExecutor},
    serializer::encode_bundle,
    submitter::{BundleSubmitter, SubmissionOutcome, SubmitterSettings},
    waiter::{ConfirmationOutcome, ConfirmationSettings, ConfirmationWaiter},
};

/// Errors returned before any network activity
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The transactions do not form a valid bundle
    #[error(transparent)]
    Bundle(#[from] BundleError),
}

/// Per-call execution options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecuteOptions {
    /// Send transactions one by one if the bundle does not land
    pub fallback_enabled: bool,
    /// How long to wait for an accepted bundle to land
    pub confirmation_timeout: Duration,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            fallback_enabled: true,
            confirmation_timeout: Duration::from_secs(60),
        }
    }
}

/// Settings of every stage of execution
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ExecutorSettings {
    /// Bundle submission
    pub submitter: SubmitterSettings,
    /// Bundle confirmation
    pub confirmation: ConfirmationSettings,
    /// Sequential fallback
    pub fallback: FallbackSettings,
}

/// Executes sets of transactions atomically through a relay, falling back to
/// sending them one by one through the ledger.
///
/// Holds no per-call state, so a single executor can serve concurrent calls.
pub struct BundleExecutor<R, L> {
    submitter: BundleSubmitter<R>,
    waiter: ConfirmationWaiter<R, L>,
    fallback: SequentialFallbackExecutor<L>,
    event_sender: Option<broadcast::Sender<ExecutionEvent>>,
    metrics: ExecutorMetrics,
}

impl<R, L> BundleExecutor<R, L>
where
    R: RelayProvider,
    L: LedgerProvider,
{
    /// Create an executor
    pub fn new(
        relay: Arc<R>,
        ledger: Arc<L>,
        pool: RelayEndpointPool,
        settings: ExecutorSettings,
    ) -> Self {
        let request_timeout = settings.submitter.request_timeout;
        Self {
            submitter: BundleSubmitter::new(Arc::clone(&relay), pool, settings.submitter),
            waiter: ConfirmationWaiter::from_providers(
                relay,
                Arc::clone(&ledger),
                request_timeout,
                settings.confirmation,
            ),
            fallback: SequentialFallbackExecutor::new(ledger, settings.fallback),
            event_sender: None,
            metrics: ExecutorMetrics::default(),
        }
    }

    /// Emit execution events to `sender`
    pub fn with_event_sender(mut self, sender: broadcast::Sender<ExecutionEvent>) -> Self {
        self.fallback = self.fallback.with_event_sender(sender.clone());
        self.event_sender = Some(sender);
        self
    }

    /// Execute `transactions` as a bundle.
    ///
    /// Fails without any network activity if the transactions cannot form a
    /// bundle. Every other failure is reported in the returned result.
    #[instrument(skip_all, fields(transactions = transactions.len()))]
    pub async fn execute(
        &self,
        transactions: Vec<SignedTransaction>,
        options: ExecuteOptions,
    ) -> Result<ExecutionResult, EngineError> {
        let bundle = Bundle::new(transactions)?;
        let encoded = encode_bundle(bundle.transactions())?;
        self.metrics.executions.increment(1);

        let submission = self.submitter.submit(&encoded).await;
        let (bundle_id, bundle_error) = match submission.outcome {
            SubmissionOutcome::Accepted {
                bundle_id,
                endpoint,
            } => {
                self.emit(ExecutionEvent::BundleSubmitted {
                    bundle_id: bundle_id.clone(),
                    endpoint: endpoint.clone(),
                    attempts: submission.attempts.len(),
                });

                let status_endpoint = self.submitter.pool().status_endpoint(&endpoint);
                let confirmation = self
                    .waiter
                    .wait(
                        status_endpoint,
                        &bundle_id,
                        encoded.signatures(),
                        options.confirmation_timeout,
                    )
                    .await;

                match confirmation {
                    ConfirmationOutcome::Landed { slot, channel } => {
                        info!("Bundle {bundle_id} landed, confirmed by {channel}");
                        self.metrics.bundles_landed.increment(1);
                        self.emit(ExecutionEvent::BundleLanded {
                            bundle_id: bundle_id.clone(),
                            slot,
                        });
                        let result = ExecutionResult::bundle_landed(
                            encoded.signatures().to_vec(),
                            bundle_id,
                            slot,
                        );
                        self.finish(&result);
                        return Ok(result);
                    }
                    other => {
                        let error = other
                            .error()
                            .unwrap_or_else(|| "bundle did not land".to_string());
                        self.emit(ExecutionEvent::BundleNotLanded {
                            bundle_id: bundle_id.clone(),
                            error: error.clone(),
                        });
                        (Some(bundle_id), error)
                    }
                }
            }
            SubmissionOutcome::Failed { error, .. } => {
                let attempts = submission.attempts.len();
                self.emit(ExecutionEvent::BundleSubmissionFailed {
                    error: error.clone(),
                    attempts,
                });
                (
                    None,
                    format!("submission failed after {attempts} attempts: {error}"),
                )
            }
        };

        if !options.fallback_enabled {
            warn!("Bundle failed and fallback is disabled: {bundle_error}");
            let result = ExecutionResult::bundle_failed(bundle_id, format!("bundle: {bundle_error}"));
            self.finish(&result);
            return Ok(result);
        }

        warn!("Bundle failed, sending transactions sequentially: {bundle_error}");
        self.metrics.fallbacks.increment(1);
        self.emit(ExecutionEvent::FallbackStarted {
            transactions: bundle.len(),
        });
        let outcome = self.fallback.execute(bundle.transactions()).await;

        let error = outcome
            .error_summary()
            .map(|sequential| format!("bundle: {bundle_error} | sequential: {sequential}"));
        let result =
            ExecutionResult::sequential(outcome.signatures, bundle_id, error, outcome.failures);
        self.finish(&result);
        Ok(result)
    }

    fn finish(&self, result: &ExecutionResult) {
        if !result.success {
            self.metrics.failures.increment(1);
        }
        self.emit(ExecutionEvent::ExecutionFinished {
            success: result.success,
            method: result.method,
        });
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

#[derive(Metrics)]
#[metrics(scope = "lander_executor")]
struct ExecutorMetrics {
    #[metric(describe = "the number of executions started.")]
    executions: Counter,
    #[metric(describe = "the number of bundles that landed.")]
    bundles_landed: Counter,
    #[metric(describe = "the number of executions that fell back to sequential sends.")]
    fallbacks: Counter,
    #[metric(describe = "the number of executions that did not fully succeed.")]
    failures: Counter,
}
