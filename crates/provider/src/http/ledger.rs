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

use std::{str::FromStr, time::Duration};

use lander_types::SignedTransaction;
use lander_utils::json_rpc::WithContext;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use solana_sdk::signature::Signature;

use super::post_json_rpc;
use crate::{LedgerProvider, ProviderError, ProviderResult, SendConfig, SignatureStatus};

/// Ledger provider speaking the standard JSON-RPC over HTTP
#[derive(Clone, Debug)]
pub struct HttpLedgerProvider {
    client: Client,
    url: String,
    request_timeout: Duration,
}

impl HttpLedgerProvider {
    /// Create a provider for the RPC node at `url`
    pub fn new(client: Client, url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            request_timeout,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionConfig {
    encoding: &'static str,
    #[serde(flatten)]
    send: SendConfig,
}

#[async_trait::async_trait]
impl LedgerProvider for HttpLedgerProvider {
    async fn send_transaction(
        &self,
        tx: &SignedTransaction,
        config: SendConfig,
    ) -> ProviderResult<Signature> {
        let config = SendTransactionConfig {
            encoding: "base64",
            send: config,
        };
        let signature: String = post_json_rpc(
            &self.client,
            &self.url,
            "sendTransaction",
            (tx.to_base64(), config),
            self.request_timeout,
        )
        .await?;

        Signature::from_str(&signature)
            .map_err(|e| ProviderError::InvalidResponse(format!("bad signature {signature}: {e}")))
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> ProviderResult<Vec<Option<SignatureStatus>>> {
        let signatures: Vec<String> = signatures.iter().map(ToString::to_string).collect();
        let response: WithContext<Vec<Option<SignatureStatus>>> = post_json_rpc(
            &self.client,
            &self.url,
            "getSignatureStatuses",
            (&signatures, json!({ "searchTransactionHistory": true })),
            self.request_timeout,
        )
        .await?;

        if response.value.len() != signatures.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} statuses, got {}",
                signatures.len(),
                response.value.len()
            )));
        }
        Ok(response.value)
    }
}
