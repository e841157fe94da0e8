//! Configuration management for PricePull
//!
//! Loads from YAML files + environment variables via .env

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PullConfig {
    pub network: NetworkConfig,
    pub gas: GasConfig,
    pub submit: SubmitConfig,
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Oracle network gateway endpoint
    pub rpc_url: String,
    /// Oracle program id the data requests execute
    pub program_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GasConfig {
    /// Gas estimate per queried asset
    pub per_asset: u64,
    /// Gas ceiling for a single data request
    pub max_per_request: u64,
    /// Execution gas price (network units)
    pub price: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitConfig {
    /// Submission attempts per chunk before it is marked failed
    pub max_retries: u32,
    /// First retry delay in milliseconds (doubles each attempt)
    pub backoff_base_ms: u64,
    /// Pause between chunk submissions under one signing identity
    pub inter_submit_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolveConfig {
    /// Delay between resolution polls in milliseconds
    pub poll_interval_ms: u64,
    /// Idle polls allowed before a request times out
    pub max_poll_attempts: u32,
    /// Budget for the heavier execution-result fetch, in seconds
    pub result_timeout_secs: u64,
    /// Wall-clock budget for the whole session, in seconds
    pub session_deadline_secs: u64,
}

impl SubmitConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn inter_submit_delay(&self) -> Duration {
        Duration::from_millis(self.inter_submit_delay_ms)
    }
}

impl ResolveConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn result_timeout(&self) -> Duration {
        Duration::from_secs(self.result_timeout_secs)
    }

    pub fn session_deadline(&self) -> Duration {
        Duration::from_secs(self.session_deadline_secs)
    }
}

impl PullConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let config = Config::builder()
            // Network defaults
            .set_default("network.rpc_url", "https://rpc.testnet.seda.xyz")?
            .set_default("network.program_id", "")?
            // Gas defaults (conservative estimates confirmed against testnet)
            .set_default("gas.per_asset", 80_000_000i64)?
            .set_default("gas.max_per_request", 300_000_000i64)?
            .set_default("gas.price", 10_000i64)?
            // Submission defaults
            .set_default("submit.max_retries", 3)?
            .set_default("submit.backoff_base_ms", 2_000)?
            .set_default("submit.inter_submit_delay_ms", 1_000)?
            // Resolution defaults
            .set_default("resolve.poll_interval_ms", 2_000)?
            .set_default("resolve.max_poll_attempts", 30)?
            .set_default("resolve.result_timeout_secs", 30)?
            .set_default("resolve.session_deadline_secs", 120)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (PRICEPULL_*)
            .add_source(Environment::with_prefix("PRICEPULL").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        let pull_config: PullConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        pull_config.validate()?;
        Ok(pull_config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.network.program_id.trim().is_empty() {
            bail!("network.program_id (or PRICEPULL_NETWORK__PROGRAM_ID) must be set");
        }
        if self.gas.per_asset == 0 {
            bail!("gas.per_asset must be nonzero");
        }
        if self.submit.max_retries == 0 {
            bail!("submit.max_retries must be at least 1");
        }
        if self.resolve.max_poll_attempts == 0 {
            bail!("resolve.max_poll_attempts must be at least 1");
        }
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "rpc={} program={} gas_per_asset={} max_gas={} retries={} poll_attempts={}",
            self.network.rpc_url,
            self.network.program_id,
            self.gas.per_asset,
            self.gas.max_per_request,
            self.submit.max_retries,
            self.resolve.max_poll_attempts
        )
    }
}

impl std::fmt::Display for PullConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PullConfig {
        PullConfig {
            network: NetworkConfig {
                rpc_url: "http://localhost:1317".to_string(),
                program_id: "abc123".to_string(),
            },
            gas: GasConfig {
                per_asset: 80_000_000,
                max_per_request: 300_000_000,
                price: 10_000,
            },
            submit: SubmitConfig {
                max_retries: 3,
                backoff_base_ms: 2_000,
                inter_submit_delay_ms: 1_000,
            },
            resolve: ResolveConfig {
                poll_interval_ms: 2_000,
                max_poll_attempts: 30,
                result_timeout_secs: 30,
                session_deadline_secs: 120,
            },
        }
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn empty_program_id_is_rejected() {
        let mut cfg = sample();
        cfg.network.program_id = String::new();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_gas_per_asset_is_rejected() {
        let mut cfg = sample();
        cfg.gas.per_asset = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn durations_convert_from_millis_and_secs() {
        let cfg = sample();
        assert_eq!(cfg.submit.backoff_base(), Duration::from_secs(2));
        assert_eq!(cfg.resolve.poll_interval(), Duration::from_secs(2));
        assert_eq!(cfg.resolve.session_deadline(), Duration::from_secs(120));
    }
}
