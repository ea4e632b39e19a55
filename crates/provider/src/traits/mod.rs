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

mod error;
pub use error::{ProviderError, ProviderResult};

mod ledger;
#[cfg(feature = "test-utils")]
pub use ledger::MockLedgerProvider;
pub use ledger::{ConfirmationLevel, LedgerProvider, SendConfig, SignatureStatus};

mod relay;
#[cfg(feature = "test-utils")]
pub use relay::MockRelayProvider;
pub use relay::{RelayBundleStatus, RelayProvider};
