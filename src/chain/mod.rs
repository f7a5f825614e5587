//! On-chain collaborators
//!
//! The router and ERC-20 ABIs are declared as typed `sol!` interfaces. The
//! pipeline depends only on the [`BalanceSource`] and [`SwapRouter`] traits;
//! [`RpcChain`] implements both over a JSON-RPC endpoint.

mod rpc;

pub use rpc::RpcChain;

use crate::Result;
use alloy::primitives::{Address, TxHash, U256};
use alloy::sol;
use async_trait::async_trait;
use serde::Serialize;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract UniswapV2Router {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactTokensForTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external returns (uint256[] memory amounts);
    }

    #[derive(Debug, PartialEq, Eq)]
    #[sol(rpc)]
    contract ERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

/// Arguments of `swapExactTokensForTokens`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapRequest {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub to: Address,
    /// Unix timestamp (seconds)
    pub deadline: u64,
}

/// Reads wallet balances
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Native asset balance of `owner`
    async fn native_balance(&self, owner: Address) -> Result<U256>;

    /// ERC-20 `balanceOf(owner)` on `token`
    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256>;
}

/// Quotes and submits swaps through a V2-style router
#[async_trait]
pub trait SwapRouter: Send + Sync {
    /// One amount per token in `path`; the last is the expected output
    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>>;

    /// Sign and broadcast the swap. Returns once the node accepted it.
    async fn swap_exact_tokens_for_tokens(&self, request: &SwapRequest) -> Result<TxHash>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::sol_types::SolCall;

    #[test]
    fn router_selectors_match_uniswap_v2() {
        assert_eq!(
            UniswapV2Router::getAmountsOutCall::SELECTOR,
            [0xd0, 0x6c, 0xa6, 0x1f]
        );
        assert_eq!(
            UniswapV2Router::swapExactTokensForTokensCall::SELECTOR,
            [0x38, 0xed, 0x17, 0x39]
        );
        assert_eq!(ERC20::balanceOfCall::SELECTOR, [0x70, 0xa0, 0x82, 0x31]);
    }
}
