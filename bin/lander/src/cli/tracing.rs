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

use std::io;

pub use tracing::*;
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::{
    filter::{self, LevelFilter},
    fmt,
    layer::SubscriberExt,
    EnvFilter, Layer,
};

use super::LogsArgs;

/// Transport crates whose logs are never wanted, whatever `RUST_LOG` says
const NOISY_TARGETS: &[&str] = &["h2", "hyper", "reqwest::connect", "rustls"];

/// Install the global subscriber.
///
/// The execution result is printed to stdout, so logs go to stderr unless a
/// log file is given. The returned guard flushes buffered logs when dropped.
pub fn configure_logging(args: &LogsArgs) -> anyhow::Result<WorkerGuard> {
    let (writer, guard) = match &args.file {
        Some(path) => non_blocking(rolling::never(".", path)),
        None => non_blocking(io::stderr()),
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    let quiet = filter::filter_fn(|metadata| {
        !NOISY_TARGETS
            .iter()
            .any(|target| metadata.target().starts_with(target))
    });

    let output = fmt::layer().with_writer(writer);
    let output = if args.json {
        output.json().boxed()
    } else {
        output.compact().boxed()
    };

    subscriber::set_global_default(
        tracing_subscriber::registry()
            .with(env_filter)
            .with(quiet)
            .with(output),
    )?;

    // Redirect logs from external crates using `log` to the tracing subscriber
    LogTracer::init()?;

    Ok(guard)
}
