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

use std::time::Duration;

use anyhow::Context;
use clap::Args;
use lander_engine::TipInstructionBuilder;
use lander_provider::{TipFloorClient, TipPercentile};
use reqwest::Client;
use serde_json::json;
use solana_sdk::pubkey::Pubkey;

use super::config::LanderConfig;

/// CLI options for suggesting a tip
#[derive(Debug, Args)]
pub struct TipArgs {
    /// Percentile of recently landed tips to suggest
    ///
    /// One of p25, p50, p75, p95, p99, ema50
    #[arg(long = "percentile", default_value = "p50")]
    percentile: TipPercentile,

    /// Preview the tip transfer this payer would make
    #[arg(long = "payer")]
    payer: Option<Pubkey>,
}

pub async fn run(args: TipArgs, config: &LanderConfig) -> anyhow::Result<()> {
    let client = Client::builder()
        .build()
        .context("should build http client")?;
    let tip_floor = TipFloorClient::new(
        client,
        config.relay.tip_floor_url.clone(),
        config.request_timeout(),
        Duration::from_millis(config.relay.tip_floor_cooldown_ms),
    );
    let builder = TipInstructionBuilder::new(config.tip_settings());

    // the tip floor is advisory, fall back to the configured default
    let (lamports, source) = match tip_floor.suggest(args.percentile).await {
        Ok(lamports) => (builder.tip_amount(Some(lamports)), "tip_floor"),
        Err(err) => {
            tracing::warn!("Tip floor unavailable, using default tip: {err}");
            (builder.tip_amount(None), "default")
        }
    };

    let mut output = json!({
        "percentile": args.percentile.to_string(),
        "lamports": lamports,
        "source": source,
    });
    if let Some(payer) = args.payer {
        let ix = builder.build(&payer, Some(lamports));
        output["instruction"] = json!({
            "program": ix.program_id.to_string(),
            "from": payer.to_string(),
            "to": ix.accounts.get(1).map(|a| a.pubkey.to_string()),
        });
    }
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
