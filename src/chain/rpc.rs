//! JSON-RPC implementation of the chain collaborators
//!
//! One provider per process. With a wallet attached it fills nonce, gas and
//! chain id and signs locally; without one it can only read and quote.

use super::{BalanceSource, SwapRequest, SwapRouter, UniswapV2Router, ERC20};
use crate::config::RpcConfig;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;

/// Chain access over HTTP JSON-RPC
#[derive(Clone)]
pub struct RpcChain {
    provider: DynProvider,
    router: Address,
    can_sign: bool,
}

impl RpcChain {
    /// Provider that signs with `wallet`
    pub fn with_wallet(rpc: &RpcConfig, router: Address, wallet: &SecureWallet) -> Result<Self> {
        let url = rpc.parsed_url()?;
        let provider = ProviderBuilder::new()
            .wallet(wallet.wallet().clone())
            .connect_http(url)
            .erased();

        Ok(Self {
            provider,
            router,
            can_sign: true,
        })
    }

    /// Read-only provider: balances and quotes, no submissions
    pub fn read_only(rpc: &RpcConfig, router: Address) -> Result<Self> {
        let url = rpc.parsed_url()?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self {
            provider,
            router,
            can_sign: false,
        })
    }
}

#[async_trait]
impl BalanceSource for RpcChain {
    async fn native_balance(&self, owner: Address) -> Result<U256> {
        self.provider
            .get_balance(owner)
            .await
            .map_err(|e| Error::BalanceRead(format!("native balance of {}: {}", owner, e)))
    }

    async fn token_balance(&self, token: Address, owner: Address) -> Result<U256> {
        let erc20 = ERC20::new(token, self.provider.clone());
        erc20
            .balanceOf(owner)
            .call()
            .await
            .map_err(|e| Error::BalanceRead(format!("balanceOf on {}: {}", token, e)))
    }
}

#[async_trait]
impl SwapRouter for RpcChain {
    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        let router = UniswapV2Router::new(self.router, self.provider.clone());
        router
            .getAmountsOut(amount_in, path.to_vec())
            .call()
            .await
            .map_err(|e| Error::Quote(e.to_string()))
    }

    async fn swap_exact_tokens_for_tokens(&self, request: &SwapRequest) -> Result<TxHash> {
        if !self.can_sign {
            return Err(Error::Submission(
                "no signing wallet configured (read-only provider)".to_string(),
            ));
        }

        let router = UniswapV2Router::new(self.router, self.provider.clone());
        let pending = router
            .swapExactTokensForTokens(
                request.amount_in,
                request.amount_out_min,
                request.path.clone(),
                request.to,
                U256::from(request.deadline),
            )
            .send()
            .await
            .map_err(|e| Error::Submission(e.to_string()))?;

        Ok(*pending.tx_hash())
    }
}
