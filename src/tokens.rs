//! Token identities and amount formatting
//!
//! Candidate tokens are fetched fresh every run; the only fixed addresses are
//! the router and the base asset on Base mainnet.

use alloy::primitives::{address, utils, Address, U256};
use serde::{Deserialize, Serialize};

/// Symbol reserved for the chain's native asset in a balance snapshot
pub const NATIVE_SYMBOL: &str = "ETH";

/// Decimals of the native asset and of the base token
pub const NATIVE_DECIMALS: u8 = 18;

/// Well-known addresses on Base
pub mod addresses {
    use super::*;

    pub const WETH_BASE: Address = address!("4200000000000000000000000000000000000006");
    pub const UNISWAP_V2_ROUTER_BASE: Address =
        address!("4752ba5dbc23f44d87826276bf6fd6b1c372ad24");
}

/// A candidate token for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Market data provider id (e.g. "aerodrome-finance")
    pub id: String,
    pub symbol: String,
    /// ERC-20 contract on Base
    pub address: Address,
    /// 24h volume in the quote currency, used only for ranking
    pub volume: f64,
}

impl Token {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        address: Address,
        volume: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            address,
            volume,
        }
    }
}

/// Format a U256 value with decimals, dropping trailing fractional zeros
pub fn format_units(value: U256, decimals: u8) -> String {
    match utils::format_units(value, decimals) {
        Ok(formatted) => trim_fraction(&formatted),
        Err(_) => value.to_string(),
    }
}

/// Format an 18-decimal amount (native asset, base token)
pub fn format_ether(value: U256) -> String {
    format_units(value, NATIVE_DECIMALS)
}

fn trim_fraction(formatted: &str) -> String {
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_units() {
        let one_eth = U256::from(1_000_000_000_000_000_000u128);
        assert_eq!(format_units(one_eth, 18), "1");

        let one_point_five = U256::from(1_500_000_000_000_000_000u128);
        assert_eq!(format_units(one_point_five, 18), "1.5");

        let thousand_usdc = U256::from(1_000_000_000u64);
        assert_eq!(format_units(thousand_usdc, 6), "1000");

        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_format_ether_small_amount() {
        let min_profit = U256::from(1_000_000_000_000_000u64);
        assert_eq!(format_ether(min_profit), "0.001");
    }

    #[test]
    fn test_format_ether_keeps_integer_zeros() {
        let ten_eth = U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64));
        assert_eq!(format_ether(ten_eth), "10");
        assert_eq!(format_ether(U256::from(1u64)), "0.000000000000000001");
    }

    #[test]
    fn test_router_and_base_token_differ() {
        assert_ne!(addresses::WETH_BASE, addresses::UNISWAP_V2_ROUTER_BASE);
    }
}
