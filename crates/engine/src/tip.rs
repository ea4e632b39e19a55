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

use lander_types::constants::{DEFAULT_TIP_LAMPORTS, MIN_TIP_LAMPORTS, TIP_ACCOUNTS};
use lander_utils::random;
use rand::Rng;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_instruction};

/// Tip amounts, in lamports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TipSettings {
    /// Floor every tip is raised to
    pub min_lamports: u64,
    /// Tip used when the caller does not request one
    pub default_lamports: u64,
}

impl Default for TipSettings {
    fn default() -> Self {
        Self {
            min_lamports: MIN_TIP_LAMPORTS,
            default_lamports: DEFAULT_TIP_LAMPORTS,
        }
    }
}

/// Builds the transfer to a relay-incentive account that every bundle must
/// carry in exactly one of its transactions.
///
/// Callers attach the instruction themselves; bundles are not inspected for it.
#[derive(Clone, Copy, Debug, Default)]
pub struct TipInstructionBuilder {
    settings: TipSettings,
}

impl TipInstructionBuilder {
    /// Create a builder. A minimum below the relay's own minimum is raised to it.
    pub fn new(settings: TipSettings) -> Self {
        Self {
            settings: TipSettings {
                min_lamports: settings.min_lamports.max(MIN_TIP_LAMPORTS),
                ..settings
            },
        }
    }

    /// The amount that will actually be paid for a requested tip.
    ///
    /// Amounts below the minimum are raised to it, never rejected.
    pub fn tip_amount(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.settings.default_lamports)
            .max(self.settings.min_lamports)
    }

    /// Build a tip transfer from `payer` to a tip account chosen uniformly at
    /// random.
    pub fn build(&self, payer: &Pubkey, lamports: Option<u64>) -> Instruction {
        self.build_with_rng(payer, lamports, &mut rand::thread_rng())
    }

    /// Same as [`Self::build`], drawing the tip account from `rng`.
    pub fn build_with_rng<R: Rng + ?Sized>(
        &self,
        payer: &Pubkey,
        lamports: Option<u64>,
        rng: &mut R,
    ) -> Instruction {
        let account = *random::pick(&TIP_ACCOUNTS, rng).unwrap_or(&TIP_ACCOUNTS[0]);
        system_instruction::transfer(payer, &account, self.tip_amount(lamports))
    }

    /// Whether `account` is one of the relay-incentive accounts
    pub fn is_tip_account(account: &Pubkey) -> bool {
        TIP_ACCOUNTS.contains(account)
    }
}
