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

use anyhow::{bail, Context};
use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File, FileFormat};
use lander_engine::{
    ConfirmationSettings, ExecuteOptions, ExecutorSettings, FallbackSettings,
    RelayEndpointPool, SubmitterSettings, TipSettings,
};
use lander_provider::SendConfig;
use lander_types::constants::{
    DEFAULT_PRIMARY_RELAY, DEFAULT_REGIONAL_RELAYS, DEFAULT_TIP_FLOOR_URL, DEFAULT_TIP_LAMPORTS,
    MIN_TIP_LAMPORTS,
};
use lander_utils::retry::BackoffOpts;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "LANDER";
const DEFAULT_LEDGER_RPC: &str = "https://api.mainnet-beta.solana.com";

/// Complete configuration of the CLI
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LanderConfig {
    pub relay: RelayConfig,
    pub ledger: LedgerConfig,
    pub submission: SubmissionConfig,
    pub confirmation: ConfirmationConfig,
    pub fallback: FallbackConfig,
    pub tip: TipConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// Relay endpoints, the first is the primary
    pub endpoints: Vec<String>,
    /// Poll bundle statuses here instead of on the accepting endpoint
    pub status_endpoint: Option<String>,
    pub tip_floor_url: String,
    pub tip_floor_cooldown_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        let mut endpoints = vec![DEFAULT_PRIMARY_RELAY.to_string()];
        endpoints.extend(DEFAULT_REGIONAL_RELAYS.iter().map(|s| s.to_string()));
        Self {
            endpoints,
            status_endpoint: None,
            tip_floor_url: DEFAULT_TIP_FLOOR_URL.to_string(),
            tip_floor_cooldown_ms: 30_000,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    pub rpc_url: String,
    pub skip_preflight: bool,
    pub max_retries: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        let send = SendConfig::default();
        Self {
            rpc_url: DEFAULT_LEDGER_RPC.to_string(),
            skip_preflight: send.skip_preflight,
            max_retries: send.max_retries,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SubmissionConfig {
    pub max_attempts: u32,
    pub request_timeout_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_factor: f64,
    pub backoff_min_jitter: f64,
    pub backoff_min_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        let settings = SubmitterSettings::default();
        Self {
            max_attempts: settings.max_attempts,
            request_timeout_ms: millis(settings.request_timeout),
            backoff_base_ms: millis(settings.backoff.base),
            backoff_factor: settings.backoff.factor,
            backoff_min_jitter: settings.backoff.min_jitter,
            backoff_min_ms: millis(settings.backoff.min_delay),
            backoff_max_ms: millis(settings.backoff.max_delay),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            timeout_ms: millis(ExecuteOptions::default().confirmation_timeout),
            poll_interval_ms: millis(ConfirmationSettings::default().poll_interval),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct FallbackConfig {
    pub enabled: bool,
    pub send_delay_ms: u64,
    pub confirm_timeout_ms: u64,
    pub confirm_poll_interval_ms: u64,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        let settings = FallbackSettings::default();
        Self {
            enabled: ExecuteOptions::default().fallback_enabled,
            send_delay_ms: millis(settings.send_delay),
            confirm_timeout_ms: millis(settings.confirm_timeout),
            confirm_poll_interval_ms: millis(settings.confirm_poll_interval),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TipConfig {
    pub min_lamports: u64,
    pub default_lamports: u64,
}

impl Default for TipConfig {
    fn default() -> Self {
        Self {
            min_lamports: MIN_TIP_LAMPORTS,
            default_lamports: DEFAULT_TIP_LAMPORTS,
        }
    }
}

fn millis(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

/// Load configuration from the hierarchy of
/// - ENV (`LANDER_` prefix, `__` between nested keys)
/// - file
/// - defaults
pub fn load(file: Option<&str>) -> anyhow::Result<LanderConfig> {
    let mut builder = defaults()?;
    if let Some(file) = file {
        builder = builder.add_source(File::with_name(file));
    }
    finish(builder)
}

fn defaults() -> anyhow::Result<ConfigBuilder<DefaultState>> {
    let default = serde_json::to_string(&LanderConfig::default())
        .context("should serialize default config")?;
    Ok(Config::builder().add_source(File::from_str(default.as_str(), FileFormat::Json)))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<LanderConfig> {
    let config: LanderConfig = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("relay.endpoints")
                .try_parsing(true),
        )
        .build()
        .context("should build config")?
        .try_deserialize()
        .context("should deserialize config")?;
    config.validate()?;
    Ok(config)
}

impl LanderConfig {
    fn validate(&self) -> anyhow::Result<()> {
        if self.relay.endpoints.is_empty() {
            bail!("at least one relay endpoint must be configured");
        }
        if self.submission.max_attempts == 0 {
            bail!("submission.max_attempts must be at least 1");
        }
        if self.submission.backoff_factor < 1.0 {
            bail!("submission.backoff_factor must be at least 1.0");
        }
        if !(0.0..=1.0).contains(&self.submission.backoff_min_jitter) {
            bail!("submission.backoff_min_jitter must be within [0, 1]");
        }
        if self.submission.backoff_min_ms > self.submission.backoff_max_ms {
            bail!("submission.backoff_min_ms must not exceed submission.backoff_max_ms");
        }
        Ok(())
    }

    pub fn endpoint_pool(&self) -> anyhow::Result<RelayEndpointPool> {
        let pool = RelayEndpointPool::from_urls(self.relay.endpoints.iter().cloned())
            .context("at least one relay endpoint must be configured")?;
        Ok(pool.with_status_endpoint(self.relay.status_endpoint.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.submission.request_timeout_ms)
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        let submission = &self.submission;
        ExecutorSettings {
            submitter: SubmitterSettings {
                max_attempts: submission.max_attempts,
                request_timeout: self.request_timeout(),
                backoff: BackoffOpts {
                    base: Duration::from_millis(submission.backoff_base_ms),
                    factor: submission.backoff_factor,
                    min_jitter: submission.backoff_min_jitter,
                    min_delay: Duration::from_millis(submission.backoff_min_ms),
                    max_delay: Duration::from_millis(submission.backoff_max_ms),
                },
            },
            confirmation: ConfirmationSettings {
                poll_interval: Duration::from_millis(self.confirmation.poll_interval_ms),
            },
            fallback: FallbackSettings {
                send_delay: Duration::from_millis(self.fallback.send_delay_ms),
                send_config: SendConfig {
                    skip_preflight: self.ledger.skip_preflight,
                    max_retries: self.ledger.max_retries,
                },
                confirm_timeout: Duration::from_millis(self.fallback.confirm_timeout_ms),
                confirm_poll_interval: Duration::from_millis(
                    self.fallback.confirm_poll_interval_ms,
                ),
                request_timeout: self.request_timeout(),
            },
        }
    }

    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            fallback_enabled: self.fallback.enabled,
            confirmation_timeout: Duration::from_millis(self.confirmation.timeout_ms),
        }
    }

    pub fn tip_settings(&self) -> TipSettings {
        TipSettings {
            min_lamports: self.tip.min_lamports,
            default_lamports: self.tip.default_lamports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_toml(toml: &str) -> anyhow::Result<LanderConfig> {
        finish(defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn test_defaults_match_engine() {
        let config = load_toml("").unwrap();
        assert_eq!(config.executor_settings(), ExecutorSettings::default());
        assert_eq!(config.execute_options(), ExecuteOptions::default());
        assert_eq!(config.tip_settings(), TipSettings::default());
        assert_eq!(config.endpoint_pool().unwrap(), RelayEndpointPool::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = load_toml(
            r#"
            [relay]
            endpoints = ["http://one", "http://two"]
            status_endpoint = "http://status"

            [submission]
            max_attempts = 3
            backoff_factor = 2.0

            [fallback]
            enabled = false
            "#,
        )
        .unwrap();

        let pool = config.endpoint_pool().unwrap();
        assert_eq!(pool.primary(), "http://one");
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.status_endpoint("http://one"), "http://status");
        let settings = config.executor_settings();
        assert_eq!(settings.submitter.max_attempts, 3);
        assert_eq!(settings.submitter.backoff.factor, 2.0);
        // untouched keys keep their defaults
        assert_eq!(settings.submitter.request_timeout, Duration::from_secs(30));
        assert!(!config.execute_options().fallback_enabled);
    }

    #[test]
    fn test_confirmation_section() {
        let config = load_toml(
            r#"
            [confirmation]
            timeout_ms = 15000
            poll_interval_ms = 500
            "#,
        )
        .unwrap();

        assert_eq!(
            config.execute_options().confirmation_timeout,
            Duration::from_secs(15)
        );
        assert_eq!(
            config.executor_settings().confirmation.poll_interval,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_invalid_rejected() {
        assert!(load_toml("[submission]\nmax_attempts = 0").is_err());
        assert!(load_toml("[submission]\nbackoff_factor = 0.5").is_err());
    }
}
