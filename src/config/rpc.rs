//! RPC endpoint configuration
//!
//! The job only talks to Base mainnet. Resolution order:
//! 1. `BASE_RPC_URL` - highest priority
//! 2. `ALCHEMY_API_KEY` - builds the Alchemy Base URL
//! 3. Public RPC fallback - rate limited, for testing only
//!
//! ```bash
//! export BASE_RPC_URL="https://base-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! ```

use crate::{Error, Result};

mod env_vars {
    pub const BASE_RPC_URL: &str = "BASE_RPC_URL";
    pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
}

/// Public Base endpoint (rate limited)
pub const PUBLIC_BASE_RPC: &str = "https://mainnet.base.org";

#[derive(Debug, Clone)]
pub struct RpcConfig {
    url: String,
}

impl RpcConfig {
    /// Resolve the RPC URL from the environment
    pub fn from_env() -> Self {
        if let Ok(url) = std::env::var(env_vars::BASE_RPC_URL) {
            tracing::debug!("Using BASE_RPC_URL");
            return Self { url };
        }

        if let Ok(key) = std::env::var(env_vars::ALCHEMY_API_KEY) {
            tracing::info!("Building Base RPC URL from ALCHEMY_API_KEY");
            return Self {
                url: format!("https://base-mainnet.g.alchemy.com/v2/{}", key),
            };
        }

        tracing::warn!("No RPC configured for Base, using public RPC (rate limited)");
        Self {
            url: PUBLIC_BASE_RPC.to_string(),
        }
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parsed endpoint for alloy's HTTP transport
    pub fn parsed_url(&self) -> Result<url::Url> {
        self.url
            .parse()
            .map_err(|e| Error::Config(format!("Invalid RPC URL {:?}: {}", self.url, e)))
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
