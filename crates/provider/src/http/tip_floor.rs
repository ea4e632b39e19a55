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

//! Tip-floor advisory. Informational only, never required for a bundle to be
//! submitted.

use std::time::Duration;

use lander_types::constants::{LAMPORTS_PER_SOL, MIN_TIP_LAMPORTS};
use lander_utils::cooldown::Cooldown;
use parking_lot::Mutex;
use reqwest::Client;
use serde::Deserialize;
use strum::{Display, EnumString};

use crate::{ProviderError, ProviderResult};

/// Percentile of recently landed tips
#[derive(Clone, Copy, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum TipPercentile {
    /// 25th percentile
    P25,
    /// 50th percentile
    P50,
    /// 75th percentile
    P75,
    /// 95th percentile
    P95,
    /// 99th percentile
    P99,
    /// Exponential moving average of the 50th percentile
    Ema50,
}

/// Recently landed tip percentiles, in SOL
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TipFloor {
    /// Sample time
    #[serde(default)]
    pub time: Option<String>,
    /// 25th percentile
    pub landed_tips_25th_percentile: f64,
    /// 50th percentile
    pub landed_tips_50th_percentile: f64,
    /// 75th percentile
    pub landed_tips_75th_percentile: f64,
    /// 95th percentile
    pub landed_tips_95th_percentile: f64,
    /// 99th percentile
    pub landed_tips_99th_percentile: f64,
    /// EMA of the 50th percentile
    pub ema_landed_tips_50th_percentile: f64,
}

impl TipFloor {
    /// Tip in lamports at the given percentile, never below the relay minimum.
    pub fn lamports(&self, percentile: TipPercentile) -> u64 {
        let sol = match percentile {
            TipPercentile::P25 => self.landed_tips_25th_percentile,
            TipPercentile::P50 => self.landed_tips_50th_percentile,
            TipPercentile::P75 => self.landed_tips_75th_percentile,
            TipPercentile::P95 => self.landed_tips_95th_percentile,
            TipPercentile::P99 => self.landed_tips_99th_percentile,
            TipPercentile::Ema50 => self.ema_landed_tips_50th_percentile,
        };
        let lamports = (sol * LAMPORTS_PER_SOL as f64).round();
        // NaN and negatives saturate to 0 in the cast
        (lamports as u64).max(MIN_TIP_LAMPORTS)
    }
}

/// Client for the public tip-floor endpoint.
///
/// After a failure the client refuses to query again until its cooldown has
/// passed.
#[derive(Debug)]
pub struct TipFloorClient {
    client: Client,
    url: String,
    timeout: Duration,
    cooldown: Mutex<Cooldown>,
}

impl TipFloorClient {
    /// Create a client for `url`
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration, cooldown: Duration) -> Self {
        let url = url.into();
        Self {
            client,
            cooldown: Mutex::new(Cooldown::new(url.clone(), cooldown)),
            url,
            timeout,
        }
    }

    /// Fetch the latest tip floor
    pub async fn fetch(&self) -> ProviderResult<TipFloor> {
        if let Some(remaining) = self.cooldown.lock().remaining() {
            return Err(ProviderError::CoolingDown {
                source_name: self.url.clone(),
                remaining,
            });
        }

        let result = self.fetch_inner().await;
        let mut cooldown = self.cooldown.lock();
        match &result {
            Ok(_) => cooldown.record_success(),
            Err(e) => {
                tracing::warn!("tip floor request to {} failed: {e}", self.url);
                cooldown.record_failure();
            }
        }
        result
    }

    /// Suggest a tip in lamports at the given percentile
    pub async fn suggest(&self, percentile: TipPercentile) -> ProviderResult<u64> {
        Ok(self.fetch().await?.lamports(percentile))
    }

    async fn fetch_inner(&self) -> ProviderResult<TipFloor> {
        let response = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Http {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }
        let floors = response.json::<Vec<TipFloor>>().await?;
        floors.into_iter().next().ok_or(ProviderError::EmptyResult)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::http::test_server::serve;

    const SAMPLE: &str = r#"[{"time":"2024-09-01T12:58:00Z","landed_tips_25th_percentile":6.001000000000001e-06,"landed_tips_50th_percentile":1e-05,"landed_tips_75th_percentile":3.6196500000000005e-05,"landed_tips_95th_percentile":0.0014479055000000002,"landed_tips_99th_percentile":0.010007999,"ema_landed_tips_50th_percentile":9.836078125000002e-06}]"#;

    fn client(url: String) -> TipFloorClient {
        TipFloorClient::new(Client::new(), url, Duration::from_secs(5), Duration::from_secs(30))
    }

    #[test]
    fn test_lamports_conversion() {
        let floors: Vec<TipFloor> = serde_json::from_str(SAMPLE).unwrap();
        let floor = &floors[0];
        assert_eq!(floor.lamports(TipPercentile::P50), 10_000);
        assert_eq!(floor.lamports(TipPercentile::P75), 36_197);
        assert_eq!(floor.lamports(TipPercentile::P99), 10_007_999);
    }

    #[test]
    fn test_lamports_never_below_minimum() {
        let floors: Vec<TipFloor> = serde_json::from_str(SAMPLE).unwrap();
        let mut floor = floors[0].clone();
        floor.landed_tips_25th_percentile = 1e-7;
        assert_eq!(floor.lamports(TipPercentile::P25), MIN_TIP_LAMPORTS);
        floor.landed_tips_25th_percentile = f64::NAN;
        assert_eq!(floor.lamports(TipPercentile::P25), MIN_TIP_LAMPORTS);
    }

    #[test]
    fn test_percentile_parse() {
        assert_eq!(TipPercentile::from_str("p95").unwrap(), TipPercentile::P95);
        assert_eq!(TipPercentile::from_str("ema50").unwrap(), TipPercentile::Ema50);
        assert_eq!(TipPercentile::P25.to_string(), "p25");
        assert!(TipPercentile::from_str("p42").is_err());
    }

    #[tokio::test]
    async fn test_suggest() {
        let (url, _requests) = serve(vec![(200, SAMPLE.into())]);
        let client = client(url);
        assert_eq!(client.suggest(TipPercentile::P50).await.unwrap(), 10_000);
    }

    #[tokio::test]
    async fn test_failure_starts_cooldown() {
        let (url, requests) = serve(vec![(429, "Too Many Requests".into())]);
        let client = client(url);

        let err = client.fetch().await.unwrap_err();
        assert_eq!(err.http_status(), Some(429));
        requests.recv().unwrap();

        // second call is refused locally without reaching the server
        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, ProviderError::CoolingDown { .. }));
        assert!(requests.try_recv().is_err());
    }
}
