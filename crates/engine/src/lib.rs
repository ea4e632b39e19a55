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

#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
#![doc(test(
    no_crate_inject,
    attr(deny(warnings, rust_2018_idioms), allow(dead_code, unused_variables))
))]
//! Atomic multi-transaction bundle execution.
//!
//! Signed transactions are submitted as one bundle to a pool of redundant
//! relay endpoints, confirmed through both the relay and the ledger, and sent
//! one by one through the ledger RPC if the bundle path fails.

mod classify;
pub use classify::{classify, classify_message, is_already_processed, is_rate_limited, ErrorClass};

mod confirmation;
pub use confirmation::ChainConfirmationPoller;

mod emit;
pub use emit::ExecutionEvent;

mod endpoint_pool;
pub use endpoint_pool::RelayEndpointPool;

mod fallback;
pub use fallback::{FallbackOutcome, FallbackSettings, SequentialFallbackExecutor};

mod orchestrator;
pub use orchestrator::{BundleExecutor, EngineError, ExecuteOptions, ExecutorSettings};

mod serializer;
pub use serializer::{encode_bundle, EncodedBundle};

mod status;
pub use status::{map_relay_status, BundleStatusPoller};

mod submitter;
pub use submitter::{BundleSubmitter, SubmissionOutcome, SubmissionResult, SubmitterSettings};

mod tip;
pub use tip::{TipInstructionBuilder, TipSettings};

mod waiter;
pub use waiter::{
    ConfirmationChannel, ConfirmationOutcome, ConfirmationSettings, ConfirmationWaiter,
};
