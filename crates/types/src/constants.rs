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

//! Protocol constants for bundle relays

use solana_sdk::{pubkey, pubkey::Pubkey};

/// Maximum number of transactions a relay accepts in a single bundle.
pub const MAX_BUNDLE_SIZE: usize = 5;

/// Smallest tip, in lamports, that relays accept for a bundle.
pub const MIN_TIP_LAMPORTS: u64 = 1_000;

/// Tip used when the caller does not request a specific amount.
pub const DEFAULT_TIP_LAMPORTS: u64 = 10_000;

/// Lamports per SOL, used to convert tip-floor advisories.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Relay-incentive accounts. A tip may be paid to any of them.
pub const TIP_ACCOUNTS: [Pubkey; 8] = [
    pubkey!("96gYZGLnJYVFmbjzopPSU6QiEV5fGqZNyN9nmNhvrZU5"),
    pubkey!("HFqU5x63VTqvQss8hp11i4wVV8bD44PvwucfZ2bU7gRe"),
    pubkey!("Cw8CFyM9FkoMi7K7Crf6HNQqf4uEMzpKw6QNghXLvLkY"),
    pubkey!("ADaUMid9yfUytqMBgopwjb2DTLSokTSzL1zt6iGPaS49"),
    pubkey!("DfXygSm4jCyNCybVYYK6DwvWqjKee8pbDmJGcLWNDXjh"),
    pubkey!("ADuUkR4vqLUMWXxW9gh6D6L8pMSawimctcNZ5pGwDcEt"),
    pubkey!("DttWaMuVvTiduZRnguLF7jNxTgiMBZ1hyAumKUiL2KRL"),
    pubkey!("3AVi9Tg9Uo68tJfuvoKvqKNWKkC5wPdSSdeBnizKZ6jT"),
];

/// Primary block engine, tried first on every fresh submission.
pub const DEFAULT_PRIMARY_RELAY: &str = "https://mainnet.block-engine.jito.wtf/api/v1/bundles";

/// Regional block engines used as fallbacks when the primary rate limits.
pub const DEFAULT_REGIONAL_RELAYS: [&str; 5] = [
    "https://amsterdam.mainnet.block-engine.jito.wtf/api/v1/bundles",
    "https://frankfurt.mainnet.block-engine.jito.wtf/api/v1/bundles",
    "https://ny.mainnet.block-engine.jito.wtf/api/v1/bundles",
    "https://tokyo.mainnet.block-engine.jito.wtf/api/v1/bundles",
    "https://slc.mainnet.block-engine.jito.wtf/api/v1/bundles",
];

/// Public tip-floor advisory endpoint.
pub const DEFAULT_TIP_FLOOR_URL: &str = "https://bundles.jito.wtf/api/v1/bundles/tip_floor";
