//! Configuration for the swap job
//!
//! Everything except the signing key and the RPC endpoint lives in [`Config`],
//! which defaults to the constants the job has always run with and can be
//! overridden from a JSON file. Secrets and endpoints come from the
//! environment (see [`rpc`] and [`PRIVATE_KEY_ENV`]).

pub mod rpc;

use crate::tokens::addresses;
use crate::{Error, Result};
use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub use rpc::RpcConfig;

/// Environment variable holding the hex-encoded signing key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Optional override for the market data base URL
pub const COINGECKO_API_URL_ENV: &str = "COINGECKO_API_URL";

/// Optional CoinGecko demo API key
pub const COINGECKO_API_KEY_ENV: &str = "COINGECKO_API_KEY";

/// Upper bound on the swap deadline window (one day)
pub const MAX_DEADLINE_SECS: u64 = 24 * 60 * 60;

/// On-chain contracts the job trades through
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Uniswap V2 style router
    pub router: Address,
    /// Base asset every trade is quoted in (wrapped native token)
    pub base_token: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            router: addresses::UNISWAP_V2_ROUTER_BASE,
            base_token: addresses::WETH_BASE,
        }
    }
}

/// Market data provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// CoinGecko REST base URL
    pub api_url: String,
    /// Quote currency for prices
    pub vs_currency: String,
    /// Category filter for the token universe
    pub category: String,
    /// Number of tokens in the universe (one page)
    pub page_size: u32,
    /// Per-request timeout
    pub request_timeout_secs: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.coingecko.com/api/v3".to_string(),
            vs_currency: "usd".to_string(),
            category: "base-network".to_string(),
            page_size: 5,
            request_timeout_secs: 10,
        }
    }
}

/// Trade decision settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Trailing window for the price history, in days
    pub trend_window_days: u32,
    /// Buy when the current price is below `average * dip_ratio`
    pub dip_ratio: f64,
    /// Minimum acceptable output, in base asset units (e.g. "0.001")
    pub min_profit: String,
    /// Swap validity window after submission
    pub deadline_secs: u64,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            trend_window_days: 7,
            dip_ratio: 0.9,
            min_profit: "0.001".to_string(),
            deadline_secs: 20 * 60,
        }
    }
}

/// HTTP trigger settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load a JSON config file. Missing sections fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the file/default values
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(COINGECKO_API_URL_ENV) {
            tracing::debug!("Using {} for market data", COINGECKO_API_URL_ENV);
            self.market.api_url = url;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.market.page_size == 0 {
            return Err(Error::Config("market.page_size must be at least 1".into()));
        }
        if !(self.strategy.dip_ratio > 0.0 && self.strategy.dip_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "strategy.dip_ratio must be in (0, 1], got {}",
                self.strategy.dip_ratio
            )));
        }
        if self.strategy.deadline_secs == 0 || self.strategy.deadline_secs > MAX_DEADLINE_SECS {
            return Err(Error::Config(format!(
                "strategy.deadline_secs must be in 1..={}, got {}",
                MAX_DEADLINE_SECS, self.strategy.deadline_secs
            )));
        }
        self.min_profit_wei()?;
        Ok(())
    }

    /// Minimum profit threshold in the base asset's smallest unit
    pub fn min_profit_wei(&self) -> Result<U256> {
        parse_ether(&self.strategy.min_profit).map_err(|e| {
            Error::Config(format!(
                "strategy.min_profit {:?} is not a valid amount: {}",
                self.strategy.min_profit, e
            ))
        })
    }

    pub fn deadline_window(&self) -> Duration {
        Duration::from_secs(self.strategy.deadline_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.market.request_timeout_secs)
    }
}
