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

#[cfg(feature = "test-utils")]
use mockall::automock;
use serde::Deserialize;
use serde_json::Value;

use super::error::ProviderResult;

/// One entry of a relay's `getBundleStatuses` response.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RelayBundleStatus {
    /// Bundle id the status refers to
    #[serde(default)]
    pub bundle_id: Option<String>,
    /// Signatures of the bundle's transactions
    #[serde(default)]
    pub transactions: Vec<String>,
    /// Slot the bundle landed in
    #[serde(default)]
    pub slot: Option<u64>,
    /// `processed`, `confirmed` or `finalized`
    #[serde(default)]
    pub confirmation_status: Option<String>,
    /// Execution error. Relays report success as `{"Ok": null}`.
    #[serde(default)]
    pub err: Option<Value>,
}

impl RelayBundleStatus {
    /// The error reported for the bundle, ignoring the `{"Ok": null}` success
    /// form.
    pub fn error(&self) -> Option<&Value> {
        match &self.err {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) if map.contains_key("Ok") => None,
            Some(err) => Some(err),
        }
    }
}

/// Trait for talking to a bundle relay (block engine).
///
/// Every call takes the endpoint explicitly so that callers control rotation.
#[cfg_attr(feature = "test-utils", automock)]
#[async_trait::async_trait]
pub trait RelayProvider: Send + Sync + 'static {
    /// Submit base64-encoded transactions as one bundle, returning the
    /// relay's bundle id.
    async fn send_bundle(
        &self,
        endpoint: &str,
        transactions: &[String],
        timeout: Duration,
    ) -> ProviderResult<String>;

    /// Query the status of one bundle. `None` means the relay has no record
    /// of it yet.
    async fn get_bundle_status(
        &self,
        endpoint: &str,
        bundle_id: &str,
        timeout: Duration,
    ) -> ProviderResult<Option<RelayBundleStatus>>;
}
