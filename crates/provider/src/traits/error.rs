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

use lander_utils::json_rpc::JsonRpcError;

/// Error enumeration for relay and ledger providers
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The request did not complete within its timeout
    #[error("request timed out")]
    Timeout,
    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Non-success HTTP status
    #[error("http status {status}: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, usually a JSON-RPC error
        body: String,
    },
    /// JSON-RPC error object in a successful HTTP response
    #[error("rpc error {}: {}", .0.code, .0.full_message())]
    Rpc(JsonRpcError),
    /// Response carried neither a result nor an error
    #[error("empty result")]
    EmptyResult,
    /// Response could not be decoded
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    /// The source is cooling down after recent failures
    #[error("{source_name} cooling down for {remaining:?}")]
    CoolingDown {
        /// Source name
        source_name: String,
        /// Time left
        remaining: Duration,
    },
}

impl ProviderError {
    /// HTTP status, if the error came from one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text to match against known error messages
    pub fn message(&self) -> String {
        match self {
            Self::Rpc(err) => err.full_message(),
            Self::Http { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result of a provider call
pub type ProviderResult<T> = Result<T, ProviderError>;
