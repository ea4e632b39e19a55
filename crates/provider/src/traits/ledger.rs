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

use lander_types::SignedTransaction;
#[cfg(feature = "test-utils")]
use mockall::automock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_sdk::signature::Signature;

use super::error::ProviderResult;

/// Commitment a signature has reached.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmationLevel {
    /// Seen by the node, may still be rolled back
    Processed,
    /// Voted on by a supermajority
    Confirmed,
    /// Rooted
    Finalized,
}

/// Status of a single signature as reported by `getSignatureStatuses`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    /// Slot the transaction was processed in
    pub slot: u64,
    /// Number of confirmations, `None` once rooted
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Execution error, if any
    #[serde(default)]
    pub err: Option<Value>,
    /// Commitment reached
    #[serde(default)]
    pub confirmation_status: Option<ConfirmationLevel>,
}

impl SignatureStatus {
    /// Confirmed or finalized
    pub fn is_confirmed(&self) -> bool {
        matches!(
            self.confirmation_status,
            Some(ConfirmationLevel::Confirmed | ConfirmationLevel::Finalized)
        )
    }

    /// Execution error, treating JSON null as none
    pub fn error(&self) -> Option<&Value> {
        self.err.as_ref().filter(|e| !e.is_null())
    }
}

/// Options for a direct `sendTransaction`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendConfig {
    /// Skip the node's preflight simulation
    pub skip_preflight: bool,
    /// Number of times the node rebroadcasts the transaction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<usize>,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            skip_preflight: true,
            max_retries: Some(3),
        }
    }
}

/// Trait for the ledger's standard RPC.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait LedgerProvider: Send + Sync + 'static {
    /// Submit a single signed transaction, returning its signature.
    async fn send_transaction(
        &self,
        tx: &SignedTransaction,
        config: SendConfig,
    ) -> ProviderResult<Signature>;

    /// Look up statuses of the given signatures, searching transaction
    /// history. The result has one entry per signature, `None` if unknown.
    async fn get_signature_statuses(
        &self,
        signatures: &[Signature],
    ) -> ProviderResult<Vec<Option<SignatureStatus>>>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_status_decoding() {
        let status: SignatureStatus = serde_json::from_value(json!({
            "slot": 72,
            "confirmations": null,
            "err": null,
            "status": {"Ok": null},
            "confirmationStatus": "finalized"
        }))
        .unwrap();
        assert!(status.is_confirmed());
        assert!(status.error().is_none());

        let processed: SignatureStatus = serde_json::from_value(json!({
            "slot": 72,
            "confirmations": 0,
            "err": {"InstructionError": [0, {"Custom": 6001}]},
            "confirmationStatus": "processed"
        }))
        .unwrap();
        assert!(!processed.is_confirmed());
        assert!(processed.error().is_some());
    }

    #[test]
    fn test_send_config_shape() {
        assert_eq!(
            serde_json::to_value(SendConfig::default()).unwrap(),
            json!({"skipPreflight": true, "maxRetries": 3})
        );
    }
}
