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

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{constants::MAX_BUNDLE_SIZE, SignedTransaction};

/// Errors building or encoding a bundle. None of these are retryable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BundleError {
    /// A bundle must carry at least one transaction
    #[error("bundle is empty")]
    Empty,
    /// More transactions than a relay accepts
    #[error("bundle has {count} transactions, at most {max} are allowed")]
    TooManyTransactions {
        /// Number of transactions supplied
        count: usize,
        /// Maximum allowed
        max: usize,
    },
    /// The transaction carries no signature
    #[error("transaction is not signed")]
    Unsigned,
    /// Wire encoding or decoding failed
    #[error("transaction encoding failed: {0}")]
    Encoding(String),
}

/// An ordered set of 1 to `MAX_BUNDLE_SIZE` signed transactions that must
/// land together in a single slot or not at all.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
    transactions: Vec<SignedTransaction>,
}

impl Bundle {
    /// Create a bundle, rejecting empty and oversized input.
    pub fn new(transactions: Vec<SignedTransaction>) -> Result<Self, BundleError> {
        if transactions.is_empty() {
            return Err(BundleError::Empty);
        }
        if transactions.len() > MAX_BUNDLE_SIZE {
            return Err(BundleError::TooManyTransactions {
                count: transactions.len(),
                max: MAX_BUNDLE_SIZE,
            });
        }
        Ok(Self { transactions })
    }

    /// Transactions in submission order
    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Always false for a constructed bundle
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Consume the bundle, returning its transactions in order
    pub fn into_transactions(self) -> Vec<SignedTransaction> {
        self.transactions
    }
}

/// Status of a submitted bundle, as observed through either the relay or the
/// ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum BundleStatus {
    /// Not yet seen, or seen but not yet confirmed
    Pending,
    /// Included and confirmed
    Landed {
        /// Slot the bundle landed in, when reported
        slot: Option<u64>,
    },
    /// Rejected or executed with an error
    Failed {
        /// Reason reported by the relay or ledger
        reason: String,
    },
    /// The status could not be determined this time
    Unknown,
}

impl BundleStatus {
    /// Landed and failed are terminal, everything else must be polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Landed { .. } | Self::Failed { .. })
    }

    /// Whether the bundle landed
    pub fn is_landed(&self) -> bool {
        matches!(self, Self::Landed { .. })
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Landed { slot: Some(slot) } => write!(f, "landed (slot {slot})"),
            Self::Landed { slot: None } => write!(f, "landed"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use solana_sdk::signature::Signature;

    use super::*;

    fn txs(n: usize) -> Vec<SignedTransaction> {
        (0..n)
            .map(|i| SignedTransaction::new(vec![i as u8], Signature::new_unique()))
            .collect()
    }

    #[test]
    fn test_bundle_sizes() {
        assert_eq!(Bundle::new(vec![]), Err(BundleError::Empty));
        for n in 1..=MAX_BUNDLE_SIZE {
            assert_eq!(Bundle::new(txs(n)).unwrap().len(), n);
        }
        assert_eq!(
            Bundle::new(txs(MAX_BUNDLE_SIZE + 1)),
            Err(BundleError::TooManyTransactions { count: 6, max: 5 })
        );
    }

    #[test]
    fn test_bundle_preserves_order() {
        let input = txs(4);
        let bundle = Bundle::new(input.clone()).unwrap();
        assert_eq!(bundle.into_transactions(), input);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!BundleStatus::Pending.is_terminal());
        assert!(!BundleStatus::Unknown.is_terminal());
        assert!(BundleStatus::Landed { slot: Some(9) }.is_terminal());
        assert!(BundleStatus::Failed {
            reason: "dropped".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(
            BundleStatus::Landed { slot: Some(123) }.to_string(),
            "landed (slot 123)"
        );
        assert_eq!(
            BundleStatus::Failed {
                reason: "sim fail".into()
            }
            .to_string(),
            "failed: sim fail"
        );
    }
}
