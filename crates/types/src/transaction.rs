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

use base64::{engine::general_purpose::STANDARD, Engine};
use solana_sdk::{signature::Signature, transaction::VersionedTransaction};

use crate::BundleError;

/// An already-signed transaction in wire form, together with its first
/// signature, which identifies the transaction on the ledger.
///
/// The engine never inspects or modifies the wire bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedTransaction {
    wire: Vec<u8>,
    signature: Signature,
}

impl SignedTransaction {
    /// Create from raw wire bytes and the signature that identifies them.
    pub fn new(wire: Vec<u8>, signature: Signature) -> Self {
        Self { wire, signature }
    }

    /// Serialize a signed versioned transaction into its wire form.
    pub fn from_versioned(tx: &VersionedTransaction) -> Result<Self, BundleError> {
        let signature = *tx.signatures.first().ok_or(BundleError::Unsigned)?;
        let wire = bincode::serialize(tx).map_err(|e| BundleError::Encoding(e.to_string()))?;
        Ok(Self { wire, signature })
    }

    /// Decode a base64 wire transaction, extracting its first signature.
    pub fn from_base64(encoded: &str) -> Result<Self, BundleError> {
        let wire = STANDARD
            .decode(encoded.trim())
            .map_err(|e| BundleError::Encoding(e.to_string()))?;
        let tx: VersionedTransaction =
            bincode::deserialize(&wire).map_err(|e| BundleError::Encoding(e.to_string()))?;
        let signature = *tx.signatures.first().ok_or(BundleError::Unsigned)?;
        Ok(Self { wire, signature })
    }

    /// The signature identifying this transaction.
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Raw wire bytes.
    pub fn wire(&self) -> &[u8] {
        &self.wire
    }

    /// Base64 encoding of the wire bytes, as relays and ledger nodes expect.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.wire)
    }
}
