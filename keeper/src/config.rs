//! # Keeper Configuration
//!
//! Loaded from a JSON file. Every field is optional; omitted fields take the
//! defaults below. Example:
//!
//! ```json
//! {
//!   "flush_interval_ms": 300000,
//!   "delay_between_actions_ms": 1000,
//!   "swap_overrides": { "gas_limit": 400000, "slippage_bps": 50 },
//!   "default_decimals": 18,
//!   "token_decimals": { "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48": 6 },
//!   "api_port": 9750,
//!   "metrics_port": 9751
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use reward_tracker::config::{
    DEFAULT_DELAY_BETWEEN_ACTIONS, DEFAULT_FLUSH_INTERVAL, MAX_TOKEN_DECIMALS, WAD_DECIMALS,
};
use reward_tracker::{SwapOverrides, TrackerConfig};

/// Default port for the ingestion API.
pub const DEFAULT_API_PORT: u16 = 9750;

/// Default port for the Prometheus endpoint.
pub const DEFAULT_METRICS_PORT: u16 = 9751;

/// Full keeper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeeperConfig {
    /// Period between scheduled flush cycles.
    pub flush_interval_ms: u64,

    /// Sleep after each successful dispatch.
    pub delay_between_actions_ms: u64,

    /// Forwarded to every swap.
    pub swap_overrides: SwapOverrides,

    /// Decimals reported for tokens missing from `token_decimals`.
    pub default_decimals: u8,

    /// Per-token decimals served by the dry-run lookup.
    pub token_decimals: HashMap<String, u8>,

    pub api_port: u16,
    pub metrics_port: u16,
}

impl Default for KeeperConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: DEFAULT_FLUSH_INTERVAL.as_millis() as u64,
            delay_between_actions_ms: DEFAULT_DELAY_BETWEEN_ACTIONS.as_millis() as u64,
            swap_overrides: SwapOverrides::default(),
            default_decimals: WAD_DECIMALS as u8,
            token_decimals: HashMap::new(),
            api_port: DEFAULT_API_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}

impl KeeperConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: KeeperConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would make the keeper misbehave at runtime.
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval_ms == 0 {
            bail!("flush_interval_ms must be greater than zero");
        }
        if self.default_decimals > MAX_TOKEN_DECIMALS {
            bail!(
                "default_decimals {} exceeds maximum {}",
                self.default_decimals,
                MAX_TOKEN_DECIMALS
            );
        }
        if let Some((token, decimals)) = self
            .token_decimals
            .iter()
            .find(|(_, d)| **d > MAX_TOKEN_DECIMALS)
        {
            bail!(
                "token_decimals[{}] = {} exceeds maximum {}",
                token,
                decimals,
                MAX_TOKEN_DECIMALS
            );
        }
        if self.api_port == self.metrics_port {
            bail!("api_port and metrics_port must differ (both {})", self.api_port);
        }
        Ok(())
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    /// The part of this config the tracker consumes.
    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            delay_between_actions: Duration::from_millis(self.delay_between_actions_ms),
            swap_overrides: self.swap_overrides.clone(),
        }
    }
}
