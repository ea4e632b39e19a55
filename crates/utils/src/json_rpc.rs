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

//! JSON-RPC 2.0 envelopes shared by relay and ledger clients

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The error code for internal errors in JSON-RPC responses
pub const INTERNAL_ERROR_CODE: i64 = -32603;

/// A JSON-RPC request
#[derive(Debug, Serialize)]
pub struct JsonRpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

impl<'a, P: Serialize> JsonRpcRequest<'a, P> {
    /// Build a request with id 1
    pub fn new(method: &'a str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        }
    }
}

/// A JSON-RPC response carrying either a result or an error
#[derive(Debug, Deserialize)]
pub struct JsonRpcResponse<R> {
    /// Present on success
    pub result: Option<R>,
    /// Present on failure
    #[serde(default)]
    pub error: Option<JsonRpcError>,
}

/// The error object of a JSON-RPC response
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct JsonRpcError {
    /// Error code
    pub code: i64,
    /// Error message
    pub message: String,
    /// Optional structured data
    #[serde(default)]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Message and data flattened into one string, suitable for matching
    /// against known error text.
    pub fn full_message(&self) -> String {
        match &self.data {
            Some(Value::Null) | None => self.message.clone(),
            Some(data) => format!("{} ({data})", self.message),
        }
    }
}

/// Responses from Solana-style RPCs wrap values in a context object
#[derive(Debug, Deserialize)]
pub struct WithContext<T> {
    /// The wrapped value
    pub value: T,
}
