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

use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

mod config;
mod execute;
mod metrics;
mod tip;
mod tracing;

use execute::ExecuteArgs;
use tip::TipArgs;

/// Main entry point for the CLI
///
/// Parses the CLI arguments, loads configuration and runs the subcommand.
pub async fn run() -> anyhow::Result<()> {
    let opt = Cli::parse();
    let _guard = tracing::configure_logging(&opt.logs)?;
    tracing::info!("Parsed CLI options: {:#?}", opt);

    if let Some(listen_addr) = opt.metrics.listen_addr()? {
        metrics::initialize(listen_addr)?;
    }

    let config = config::load(opt.common.config.as_deref())?;
    tracing::debug!("Configuration: {:#?}", config);

    match opt.command {
        Command::Execute(args) => execute::run(args, &config).await,
        Command::Tip(args) => tip::run(args, &config).await,
    }
}

/// CLI commands
#[derive(Debug, Subcommand)]
enum Command {
    /// Execute a file of signed transactions as one bundle
    ///
    /// Falls back to sending them one by one unless disabled.
    #[command(name = "execute")]
    Execute(ExecuteArgs),

    /// Suggest a bundle tip from recently landed tips
    #[command(name = "tip")]
    Tip(TipArgs),
}

/// CLI common options
#[derive(Debug, Args)]
#[command(next_help_heading = "Common")]
pub struct CommonArgs {
    /// Configuration file (TOML, JSON or YAML)
    ///
    /// Values are overridden by `LANDER_` environment variables, e.g.
    /// `LANDER_SUBMISSION__MAX_ATTEMPTS=3`.
    #[arg(long = "config", name = "config", env = "LANDER_CONFIG", global = true)]
    config: Option<String>,
}

/// CLI options for the metrics exporter
#[derive(Debug, Args)]
#[command(next_help_heading = "Metrics")]
pub struct MetricsArgs {
    /// Port to serve prometheus metrics on. Disabled if not set.
    #[arg(
        long = "metrics.port",
        name = "metrics.port",
        env = "METRICS_PORT",
        global = true
    )]
    port: Option<u16>,

    /// Host to serve prometheus metrics on
    #[arg(
        long = "metrics.host",
        name = "metrics.host",
        env = "METRICS_HOST",
        default_value = "0.0.0.0",
        global = true
    )]
    host: String,
}

impl MetricsArgs {
    fn listen_addr(&self) -> anyhow::Result<Option<SocketAddr>> {
        self.port
            .map(|port| format!("{}:{}", self.host, port).parse())
            .transpose()
            .map_err(Into::into)
    }
}

/// CLI options for logging
#[derive(Debug, Args)]
#[command(next_help_heading = "Logging")]
pub struct LogsArgs {
    /// Log file
    ///
    /// If not provided, logs will be written to stderr
    #[arg(
        long = "log.file",
        name = "log.file",
        env = "LOG_FILE",
        default_value = None,
        global = true
    )]
    file: Option<String>,

    /// Log JSON
    ///
    /// If set, logs will be written in JSON format
    #[arg(
        long = "log.json",
        name = "log.json",
        env = "LOG_JSON",
        required = false,
        num_args = 0,
        global = true
    )]
    json: bool,
}

/// CLI options
#[derive(Debug, Parser)]
#[command(name = "lander", version, about = "Atomic bundle execution")]
pub struct Cli {
    #[clap(subcommand)]
    command: Command,

    #[clap(flatten)]
    common: CommonArgs,

    #[clap(flatten)]
    metrics: MetricsArgs,

    #[clap(flatten)]
    logs: LogsArgs,
}
