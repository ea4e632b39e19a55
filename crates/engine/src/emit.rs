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

use std::fmt::Display;

use lander_types::ExecutionMethod;
use solana_sdk::signature::Signature;

/// Event emitted while executing a set of transactions
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// A relay accepted the bundle
    BundleSubmitted {
        /// Relay-assigned bundle id
        bundle_id: String,
        /// Endpoint that accepted it
        endpoint: String,
        /// Number of attempts it took
        attempts: usize,
    },
    /// No relay accepted the bundle
    BundleSubmissionFailed {
        /// Last error
        error: String,
        /// Number of attempts made
        attempts: usize,
    },
    /// The bundle landed
    BundleLanded {
        /// Relay-assigned bundle id
        bundle_id: String,
        /// Landing slot
        slot: Option<u64>,
    },
    /// The bundle was accepted but did not land
    BundleNotLanded {
        /// Relay-assigned bundle id
        bundle_id: String,
        /// Why
        error: String,
    },
    /// Falling back to sending transactions one by one
    FallbackStarted {
        /// Number of transactions
        transactions: usize,
    },
    /// A transaction sent by the fallback path confirmed
    FallbackTransactionConfirmed {
        /// Position in the input
        index: usize,
        /// Transaction signature
        signature: Signature,
    },
    /// A transaction sent by the fallback path failed
    FallbackTransactionFailed {
        /// Position in the input
        index: usize,
        /// Transaction signature
        signature: Signature,
        /// Why
        reason: String,
    },
    /// Execution finished
    ExecutionFinished {
        /// Whether every transaction confirmed
        success: bool,
        /// Path taken
        method: ExecutionMethod,
    },
}

impl Display for ExecutionEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionEvent::BundleSubmitted {
                bundle_id,
                endpoint,
                attempts,
            } => write!(
                f,
                concat!(
                    "Bundle submitted!",
                    "    Bundle id: {}",
                    "    Endpoint: {}",
                    "    Attempts: {}",
                ),
                bundle_id, endpoint, attempts
            ),
            ExecutionEvent::BundleSubmissionFailed { error, attempts } => write!(
                f,
                "Bundle submission failed after {attempts} attempts: {error}"
            ),
            ExecutionEvent::BundleLanded { bundle_id, slot } => match slot {
                Some(slot) => write!(f, "Bundle {bundle_id} landed in slot {slot}"),
                None => write!(f, "Bundle {bundle_id} landed"),
            },
            ExecutionEvent::BundleNotLanded { bundle_id, error } => {
                write!(f, "Bundle {bundle_id} did not land: {error}")
            }
            ExecutionEvent::FallbackStarted { transactions } => write!(
                f,
                "Falling back to sequential submission of {transactions} transactions"
            ),
            ExecutionEvent::FallbackTransactionConfirmed { index, signature } => {
                write!(f, "Transaction {index} confirmed: {signature}")
            }
            ExecutionEvent::FallbackTransactionFailed {
                index,
                signature,
                reason,
            } => write!(f, "Transaction {index} ({signature}) failed: {reason}"),
            ExecutionEvent::ExecutionFinished { success, method } => {
                let status = if *success { "succeeded" } else { "failed" };
                write!(f, "Execution via {method} {status}")
            }
        }
    }
}
