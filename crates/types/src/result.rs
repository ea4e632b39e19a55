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

use parse_display::Display;
use serde::{Serialize, Serializer};
use solana_sdk::signature::Signature;

/// How an execution ultimately reached the ledger.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Serialize)]
#[display(style = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMethod {
    /// Submitted atomically through a relay
    Bundle,
    /// Submitted one by one through the ledger RPC
    Sequential,
}

/// Outcome of a single submission attempt against one relay endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The relay accepted the bundle
    Accepted {
        /// Identifier to poll for status
        bundle_id: String,
    },
    /// The attempt failed but another may succeed
    Retryable {
        /// Error text
        error: String,
        /// The relay signalled rate limiting, so the next attempt rotates endpoints
        rate_limited: bool,
    },
    /// The bundle itself is invalid, no further attempts are made
    Fatal {
        /// Error text
        error: String,
    },
}

/// Record of one submission attempt, kept for the life of a single submit call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionAttempt {
    /// 1-based attempt number
    pub attempt: u32,
    /// Endpoint the bundle was sent to
    pub endpoint: String,
    /// Time slept before this attempt
    pub backoff: Duration,
    /// What happened
    pub outcome: AttemptOutcome,
}

/// A transaction that failed during sequential execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TransactionFailure {
    /// Position of the transaction in the caller's input
    pub index: usize,
    /// Signature of the failed transaction
    #[serde(serialize_with = "serialize_signature")]
    pub signature: Signature,
    /// Reason for failure
    pub reason: String,
}

/// The caller-visible result of executing a set of transactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// True only if every transaction confirmed
    pub success: bool,
    /// Path taken to the ledger
    pub method: ExecutionMethod,
    /// Signatures that actually confirmed, in input order
    #[serde(serialize_with = "serialize_signatures")]
    pub signatures: Vec<Signature>,
    /// Relay bundle id, if the relay accepted the bundle
    pub bundle_id: Option<String>,
    /// Landing slot, if known
    pub slot: Option<u64>,
    /// Combined error trail, e.g. `bundle: <reason> | sequential: <reason>`
    pub error: Option<String>,
    /// Per-transaction failures from sequential execution
    pub failures: Vec<TransactionFailure>,
}

impl ExecutionResult {
    /// A bundle that landed
    pub fn bundle_landed(signatures: Vec<Signature>, bundle_id: String, slot: Option<u64>) -> Self {
        Self {
            success: true,
            method: ExecutionMethod::Bundle,
            signatures,
            bundle_id: Some(bundle_id),
            slot,
            error: None,
            failures: vec![],
        }
    }

    /// A bundle that did not land, with no fallback attempted
    pub fn bundle_failed(bundle_id: Option<String>, error: String) -> Self {
        Self {
            success: false,
            method: ExecutionMethod::Bundle,
            signatures: vec![],
            bundle_id,
            slot: None,
            error: Some(error),
            failures: vec![],
        }
    }

    /// Result of sending the transactions one by one after the bundle path
    /// failed
    pub fn sequential(
        signatures: Vec<Signature>,
        bundle_id: Option<String>,
        error: Option<String>,
        failures: Vec<TransactionFailure>,
    ) -> Self {
        Self {
            success: failures.is_empty(),
            method: ExecutionMethod::Sequential,
            signatures,
            bundle_id,
            slot: None,
            error,
            failures,
        }
    }
}

fn serialize_signature<S: Serializer>(sig: &Signature, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(sig)
}

fn serialize_signatures<S: Serializer>(sigs: &[Signature], s: S) -> Result<S::Ok, S::Error> {
    s.collect_seq(sigs.iter().map(|sig| sig.to_string()))
}
