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

use lander_utils::json_rpc::{JsonRpcRequest, JsonRpcResponse};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use crate::{ProviderError, ProviderResult};

mod ledger;
pub use ledger::HttpLedgerProvider;

mod relay;
pub use relay::HttpRelayProvider;

pub(crate) mod tip_floor;

/// Post a JSON-RPC request and decode its result.
///
/// Non-success HTTP statuses are reported with their body so that callers can
/// inspect rate-limit and error text.
async fn post_json_rpc<P, R>(
    client: &Client,
    url: &str,
    method: &str,
    params: P,
    timeout: Duration,
) -> ProviderResult<R>
where
    P: Serialize + Send,
    R: DeserializeOwned,
{
    let response = client
        .post(url)
        .timeout(timeout)
        .json(&JsonRpcRequest::new(method, params))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("{method} to {url} returned {status}: {body}");
        return Err(ProviderError::Http {
            status: status.as_u16(),
            body,
        });
    }

    let parsed = response
        .json::<JsonRpcResponse<R>>()
        .await
        .map_err(|e| ProviderError::InvalidResponse(format!("{method}: {e}")))?;
    if let Some(error) = parsed.error {
        return Err(ProviderError::Rpc(error));
    }
    parsed.result.ok_or(ProviderError::EmptyResult)
}
