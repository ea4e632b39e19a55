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

use std::time::Duration;

use lander_utils::json_rpc::WithContext;
use reqwest::Client;
use serde_json::json;

use super::post_json_rpc;
use crate::{ProviderError, ProviderResult, RelayBundleStatus, RelayProvider};

/// Relay provider speaking JSON-RPC over HTTP
#[derive(Clone, Debug, Default)]
pub struct HttpRelayProvider {
    client: Client,
}

impl HttpRelayProvider {
    /// Create a provider using the given HTTP client
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl RelayProvider for HttpRelayProvider {
    async fn send_bundle(
        &self,
        endpoint: &str,
        transactions: &[String],
        timeout: Duration,
    ) -> ProviderResult<String> {
        post_json_rpc(
            &self.client,
            endpoint,
            "sendBundle",
            (transactions, json!({ "encoding": "base64" })),
            timeout,
        )
        .await
    }

    async fn get_bundle_status(
        &self,
        endpoint: &str,
        bundle_id: &str,
        timeout: Duration,
    ) -> ProviderResult<Option<RelayBundleStatus>> {
        let response = post_json_rpc::<_, WithContext<Option<Vec<Option<RelayBundleStatus>>>>>(
            &self.client,
            endpoint,
            "getBundleStatuses",
            ([bundle_id],),
            timeout,
        )
        .await;

        match response {
            Ok(with_context) => Ok(with_context
                .value
                .and_then(|statuses| statuses.into_iter().next().flatten())),
            // relays answer `null`, or a `null` entry, for bundles they have not indexed yet
            Err(ProviderError::EmptyResult) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
