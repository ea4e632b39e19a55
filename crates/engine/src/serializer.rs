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

use lander_types::{constants::MAX_BUNDLE_SIZE, BundleError, SignedTransaction};
use solana_sdk::signature::Signature;

/// A bundle in the relay's transport encoding.
///
/// Transactions are base64 encoded. The base58 encoding some relays still
/// accept is deprecated and not produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedBundle {
    transactions: Vec<String>,
    signatures: Vec<Signature>,
}

impl EncodedBundle {
    /// Name of the encoding, as sent to the relay
    pub const ENCODING: &'static str = "base64";

    /// Encoded transactions, in bundle order
    pub fn transactions(&self) -> &[String] {
        &self.transactions
    }

    /// Signatures of the transactions, in bundle order
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always false for an encoded bundle
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Encode 1 to `MAX_BUNDLE_SIZE` signed transactions for submission.
///
/// Oversized or empty input is a caller error and fails immediately.
pub fn encode_bundle(transactions: &[SignedTransaction]) -> Result<EncodedBundle, BundleError> {
    if transactions.is_empty() {
        return Err(BundleError::Empty);
    }
    if transactions.len() > MAX_BUNDLE_SIZE {
        return Err(BundleError::TooManyTransactions {
            count: transactions.len(),
            max: MAX_BUNDLE_SIZE,
        });
    }

    Ok(EncodedBundle {
        transactions: transactions.iter().map(SignedTransaction::to_base64).collect(),
        signatures: transactions.iter().map(SignedTransaction::signature).collect(),
    })
}
