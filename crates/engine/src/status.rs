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

use lander_provider::{ProviderError, RelayBundleStatus, RelayProvider};
use lander_types::BundleStatus;
use tracing::{debug, warn};

const LANDED_CONFIRMATION_STATUSES: &[&str] = &["confirmed", "finalized"];

/// Queries a relay for the status of one bundle
pub struct BundleStatusPoller<R> {
    relay: Arc<R>,
    request_timeout: Duration,
}

impl<R> BundleStatusPoller<R>
where
    R: RelayProvider,
{
    /// Create a poller
    pub fn new(relay: Arc<R>, request_timeout: Duration) -> Self {
        Self {
            relay,
            request_timeout,
        }
    }

    /// Status of `bundle_id` as seen by the relay at `endpoint`.
    ///
    /// A relay that has not indexed the bundle yet reports it as pending.
    /// Failure to reach the relay is reported as unknown, never as failed.
    pub async fn status(&self, endpoint: &str, bundle_id: &str) -> BundleStatus {
        let result = tokio::time::timeout(
            self.request_timeout,
            self.relay
                .get_bundle_status(endpoint, bundle_id, self.request_timeout),
        )
        .await
        .unwrap_or(Err(ProviderError::Timeout));

        match result {
            Ok(Some(status)) => map_relay_status(&status),
            Ok(None) => {
                debug!("Bundle {bundle_id} not yet indexed by {endpoint}");
                BundleStatus::Pending
            }
            Err(err) => {
                warn!("Failed to query status of bundle {bundle_id} from {endpoint}: {err}");
                BundleStatus::Unknown
            }
        }
    }
}

/// Map a relay status entry to a bundle status.
///
/// A reported error takes priority over the confirmation level.
pub fn map_relay_status(status: &RelayBundleStatus) -> BundleStatus {
    if let Some(err) = status.error() {
        return BundleStatus::Failed {
            reason: err.to_string(),
        };
    }
    match status.confirmation_status.as_deref() {
        Some(level) if LANDED_CONFIRMATION_STATUSES.contains(&level) => BundleStatus::Landed {
            slot: status.slot,
        },
        _ => BundleStatus::Pending,
    }
}

#[cfg(test)]
mod tests {
    use lander_provider::MockRelayProvider;
    use serde_json::json;

    use super::*;

    fn entry(confirmation: Option<&str>, slot: Option<u64>, err: serde_json::Value) -> RelayBundleStatus {
        RelayBundleStatus {
            bundle_id: Some("b".into()),
            transactions: vec![],
            slot,
            confirmation_status: confirmation.map(str::to_string),
            err: Some(err),
        }
    }

    #[test]
    fn test_map_relay_status() {
        assert_eq!(
            map_relay_status(&entry(Some("finalized"), Some(10), json!({"Ok": null}))),
            BundleStatus::Landed { slot: Some(10) }
        );
        assert_eq!(
            map_relay_status(&entry(Some("confirmed"), Some(11), json!(null))),
            BundleStatus::Landed { slot: Some(11) }
        );
        assert_eq!(
            map_relay_status(&entry(Some("processed"), Some(12), json!({"Ok": null}))),
            BundleStatus::Pending
        );
        assert_eq!(
            map_relay_status(&entry(None, None, json!(null))),
            BundleStatus::Pending
        );
    }

    #[test]
    fn test_error_beats_confirmation() {
        let status = entry(Some("finalized"), Some(10), json!({"Err": "BundleFailed"}));
        assert!(matches!(
            map_relay_status(&status),
            BundleStatus::Failed { reason } if reason.contains("BundleFailed")
        ));
    }

    #[tokio::test]
    async fn test_not_indexed_is_pending() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .times(1)
            .returning(|_, _, _| Ok(None));
        let poller = BundleStatusPoller::new(Arc::new(relay), Duration::from_secs(1));
        assert_eq!(poller.status("http://r", "b").await, BundleStatus::Pending);
    }

    #[tokio::test]
    async fn test_query_failure_is_unknown() {
        let mut relay = MockRelayProvider::new();
        relay
            .expect_get_bundle_status()
            .returning(|_, _, _| Err(ProviderError::Transport("reset".into())));
        let poller = BundleStatusPoller::new(Arc::new(relay), Duration::from_secs(1));
        assert_eq!(poller.status("http://r", "b").await, BundleStatus::Unknown);
    }
}
