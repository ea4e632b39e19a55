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

use lander_provider::{ProviderError, RelayProvider};
use lander_types::{AttemptOutcome, SubmissionAttempt};
use lander_utils::retry::BackoffOpts;
use metrics::Counter;
use metrics_derive::Metrics;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{error, info, warn};

use crate::{
    classify::{classify, is_rate_limited, ErrorClass},
    endpoint_pool::RelayEndpointPool,
    serializer::EncodedBundle,
};

/// Settings for the bundle submission retry loop
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SubmitterSettings {
    /// Maximum number of submission attempts
    pub max_attempts: u32,
    /// Timeout of each individual request
    pub request_timeout: Duration,
    /// Delay between attempts
    pub backoff: BackoffOpts,
}

impl Default for SubmitterSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            request_timeout: Duration::from_secs(30),
            backoff: BackoffOpts::default(),
        }
    }
}

/// Final outcome of a submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// A relay accepted the bundle
    Accepted {
        /// Relay-assigned bundle id
        bundle_id: String,
        /// Endpoint that accepted it
        endpoint: String,
    },
    /// No relay accepted the bundle
    Failed {
        /// Last error observed
        error: String,
        /// True if the bundle was rejected as invalid rather than attempts
        /// running out
        fatal: bool,
    },
}

/// Outcome of a submission along with every attempt made
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionResult {
    /// Final outcome
    pub outcome: SubmissionOutcome,
    /// Attempts in the order they were made
    pub attempts: Vec<SubmissionAttempt>,
}

impl SubmissionResult {
    /// Bundle id, if accepted
    pub fn bundle_id(&self) -> Option<&str> {
        match &self.outcome {
            SubmissionOutcome::Accepted { bundle_id, .. } => Some(bundle_id),
            SubmissionOutcome::Failed { .. } => None,
        }
    }

    /// Number of attempts made
    pub fn attempt_count(&self) -> usize {
        self.attempts.len()
    }
}

/// Sends an encoded bundle to the relay endpoint pool, retrying with backoff.
///
/// The primary endpoint is tried first. The endpoint only changes when a
/// relay signals rate limiting: other transient failures are not endpoint
/// specific and keep the current endpoint.
pub struct BundleSubmitter<R> {
    relay: Arc<R>,
    pool: RelayEndpointPool,
    settings: SubmitterSettings,
    metrics: SubmitterMetrics,
}

impl<R> BundleSubmitter<R>
where
    R: RelayProvider,
{
    /// Create a submitter over `pool`.
    pub fn new(relay: Arc<R>, pool: RelayEndpointPool, settings: SubmitterSettings) -> Self {
        Self {
            relay,
            pool,
            settings,
            metrics: SubmitterMetrics::default(),
        }
    }

    /// The endpoint pool
    pub fn pool(&self) -> &RelayEndpointPool {
        &self.pool
    }

    /// Submit a bundle. Each call draws its own endpoint order and jitter.
    pub async fn submit(&self, bundle: &EncodedBundle) -> SubmissionResult {
        self.submit_with_rng(bundle, &mut StdRng::from_entropy())
            .await
    }

    /// Submit a bundle, drawing endpoint order and jitter from `rng`.
    pub async fn submit_with_rng<G: Rng + Send>(
        &self,
        bundle: &EncodedBundle,
        rng: &mut G,
    ) -> SubmissionResult {
        let candidates = self.pool.ordered_candidates(rng);
        let max_attempts = self.settings.max_attempts.max(1);

        let mut attempts = Vec::with_capacity(max_attempts as usize);
        let mut index = 0;
        let mut backoff = Duration::ZERO;
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let endpoint = &candidates[index];
            self.metrics.attempts.increment(1);

            let err = match self.send(endpoint, bundle).await {
                Ok(bundle_id) => {
                    info!("Bundle {bundle_id} accepted by {endpoint} on attempt {attempt}");
                    self.metrics.accepted.increment(1);
                    attempts.push(SubmissionAttempt {
                        attempt,
                        endpoint: endpoint.clone(),
                        backoff,
                        outcome: AttemptOutcome::Accepted {
                            bundle_id: bundle_id.clone(),
                        },
                    });
                    return SubmissionResult {
                        outcome: SubmissionOutcome::Accepted {
                            bundle_id,
                            endpoint: endpoint.clone(),
                        },
                        attempts,
                    };
                }
                Err(err) => err,
            };

            let error = err.to_string();
            if classify(&err) == ErrorClass::Fatal {
                error!("Bundle rejected by {endpoint} with non-retryable error: {error}");
                self.metrics.fatal_errors.increment(1);
                attempts.push(SubmissionAttempt {
                    attempt,
                    endpoint: endpoint.clone(),
                    backoff,
                    outcome: AttemptOutcome::Fatal {
                        error: error.clone(),
                    },
                });
                return SubmissionResult {
                    outcome: SubmissionOutcome::Failed { error, fatal: true },
                    attempts,
                };
            }

            let rate_limited = is_rate_limited(&err);
            warn!(
                "Bundle submission attempt {attempt}/{max_attempts} to {endpoint} failed: {error}"
            );
            attempts.push(SubmissionAttempt {
                attempt,
                endpoint: endpoint.clone(),
                backoff,
                outcome: AttemptOutcome::Retryable {
                    error: error.clone(),
                    rate_limited,
                },
            });
            last_error = error;

            if rate_limited {
                self.metrics.rate_limited.increment(1);
                index = self.pool.rotate(index);
            }
            if attempt < max_attempts {
                backoff = self.settings.backoff.delay(attempt, rng);
                tokio::time::sleep(backoff).await;
            }
        }

        self.metrics.exhausted.increment(1);
        error!("Bundle submission failed after {max_attempts} attempts: {last_error}");
        SubmissionResult {
            outcome: SubmissionOutcome::Failed {
                error: last_error,
                fatal: false,
            },
            attempts,
        }
    }

    async fn send(&self, endpoint: &str, bundle: &EncodedBundle) -> Result<String, ProviderError> {
        let timeout = self.settings.request_timeout;
        tokio::time::timeout(
            timeout,
            self.relay
                .send_bundle(endpoint, bundle.transactions(), timeout),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout))
    }
}

#[derive(Metrics)]
#[metrics(scope = "lander_submitter")]
struct SubmitterMetrics {
    #[metric(describe = "the number of bundle submission attempts.")]
    attempts: Counter,
    #[metric(describe = "the number of bundles accepted by a relay.")]
    accepted: Counter,
    #[metric(describe = "the number of rate limited submission attempts.")]
    rate_limited: Counter,
    #[metric(describe = "the number of bundles rejected with a non-retryable error.")]
    fatal_errors: Counter,
    #[metric(describe = "the number of submissions that ran out of attempts.")]
    exhausted: Counter,
}
