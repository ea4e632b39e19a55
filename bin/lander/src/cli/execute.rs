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

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context};
use clap::Args;
use lander_engine::BundleExecutor;
use lander_provider::{HttpLedgerProvider, HttpRelayProvider};
use lander_types::SignedTransaction;
use lander_utils::emit::{self, EVENT_CHANNEL_CAPACITY};
use reqwest::Client;
use tokio::sync::broadcast;

use super::config::LanderConfig;

/// CLI options for executing a bundle
#[derive(Debug, Args)]
pub struct ExecuteArgs {
    /// File of base64-encoded signed transactions, one per line, in bundle
    /// order. Blank lines and lines starting with `#` are ignored.
    file: PathBuf,

    /// Fail instead of sending the transactions one by one if the bundle
    /// does not land
    #[arg(long = "no-fallback", env = "NO_FALLBACK", num_args = 0)]
    no_fallback: bool,

    /// Seconds to wait for an accepted bundle to land
    #[arg(long = "confirmation-timeout", name = "confirmation-timeout")]
    confirmation_timeout_secs: Option<u64>,
}

pub async fn run(args: ExecuteArgs, config: &LanderConfig) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("should read {}", args.file.display()))?;
    let transactions = parse_transactions(&contents)?;

    let mut options = config.execute_options();
    if args.no_fallback {
        options.fallback_enabled = false;
    }
    if let Some(secs) = args.confirmation_timeout_secs {
        options.confirmation_timeout = Duration::from_secs(secs);
    }

    let client = Client::builder()
        .build()
        .context("should build http client")?;
    let relay = Arc::new(HttpRelayProvider::new(client.clone()));
    let ledger = Arc::new(HttpLedgerProvider::new(
        client,
        config.ledger.rpc_url.clone(),
        config.request_timeout(),
    ));

    let (event_sender, event_receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
    let log_handle = emit::receive_and_log_events(event_receiver);

    let executor = BundleExecutor::new(
        relay,
        ledger,
        config.endpoint_pool()?,
        config.executor_settings(),
    )
    .with_event_sender(event_sender);

    tracing::info!(
        "Executing {} transactions, fallback {}",
        transactions.len(),
        if options.fallback_enabled { "enabled" } else { "disabled" }
    );
    let result = tokio::select! {
        result = executor.execute(transactions, options) => result?,
        _ = tokio::signal::ctrl_c() => bail!("interrupted before execution finished"),
    };

    // closes the event channel so the logger drains and exits
    drop(executor);
    let _ = log_handle.await;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.success {
        bail!(
            "execution via {} failed: {}",
            result.method,
            result.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

fn parse_transactions(contents: &str) -> anyhow::Result<Vec<SignedTransaction>> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(i, line)| {
            SignedTransaction::from_base64(line)
                .with_context(|| format!("transaction {i} is not a signed base64 transaction"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use solana_sdk::{
        hash::Hash, message::Message, signature::Keypair, signer::Signer, system_instruction,
        transaction::Transaction,
    };

    use super::*;

    fn encoded_transfer() -> (String, SignedTransaction) {
        let payer = Keypair::new();
        let ix = system_instruction::transfer(&payer.pubkey(), &payer.pubkey(), 1);
        let message = Message::new(&[ix], Some(&payer.pubkey()));
        let tx = Transaction::new(&[&payer], message, Hash::default());
        let signed = SignedTransaction::from_versioned(&tx.into()).unwrap();
        (signed.to_base64(), signed)
    }

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let (a, signed_a) = encoded_transfer();
        let (b, signed_b) = encoded_transfer();
        let contents = format!("# bundle\n{a}\n\n  {b}  \n");

        let parsed = parse_transactions(&contents).unwrap();
        assert_eq!(parsed, vec![signed_a, signed_b]);
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let (a, _) = encoded_transfer();
        let err = parse_transactions(&format!("{a}\nnot-a-transaction\n")).unwrap_err();
        assert!(err.to_string().contains("transaction 1"));
    }
}
