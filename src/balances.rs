//! Wallet balance snapshot
//!
//! Built once per run. A failed read for one token omits that token; a failed
//! native balance read fails the snapshot, since no trade can be sized without it.

use crate::chain::BalanceSource;
use crate::tokens::{format_ether, Token, NATIVE_SYMBOL};
use crate::Result;
use alloy::primitives::{Address, U256};
use serde::Serialize;
use std::collections::BTreeMap;

/// Balances by token symbol, plus the native asset as a distinguished entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceSnapshot {
    native: U256,
    tokens: BTreeMap<String, U256>,
}

impl BalanceSnapshot {
    pub fn new(native: U256, tokens: BTreeMap<String, U256>) -> Self {
        Self { native, tokens }
    }

    /// Native asset balance (wei)
    pub fn native(&self) -> U256 {
        self.native
    }

    /// Balance by symbol; [`NATIVE_SYMBOL`] resolves to the native entry
    pub fn get(&self, symbol: &str) -> Option<U256> {
        if symbol == NATIVE_SYMBOL {
            return Some(self.native);
        }
        self.tokens.get(symbol).copied()
    }

    /// Symbols with a recorded token balance, excluding the native entry
    pub fn token_symbols(&self) -> impl Iterator<Item = &str> {
        self.tokens.keys().map(String::as_str)
    }
}

/// Reads balances for the job's wallet
pub struct BalanceReader<'a> {
    source: &'a dyn BalanceSource,
}

impl<'a> BalanceReader<'a> {
    pub fn new(source: &'a dyn BalanceSource) -> Self {
        Self { source }
    }

    pub async fn get_balances(&self, owner: Address, tokens: &[Token]) -> Result<BalanceSnapshot> {
        tracing::info!(owner = %owner, tokens = tokens.len(), "Fetching wallet balances");
        let mut balances = BTreeMap::new();

        for token in tokens {
            match self.source.token_balance(token.address, owner).await {
                Ok(balance) => {
                    tracing::info!(symbol = %token.symbol, balance = %format_ether(balance), "Token balance");
                    balances.insert(token.symbol.clone(), balance);
                }
                Err(e) => {
                    tracing::warn!(symbol = %token.symbol, error = %e, "Error fetching balance, omitting token");
                }
            }
        }

        let native = self.source.native_balance(owner).await?;
        tracing::info!(balance = %format_ether(native), "Native {} balance", NATIVE_SYMBOL);

        Ok(BalanceSnapshot::new(native, balances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{token, FakeChain};
    use crate::Error;

    #[tokio::test]
    async fn failed_token_read_is_omitted() {
        let a = token("a", 0x0a);
        let b = token("b", 0x0b);
        let chain = FakeChain::new(U256::from(5u64))
            .with_token_balance(a.address, U256::from(7u64))
            .with_failing_balance(b.address);

        let snapshot = BalanceReader::new(&chain)
            .get_balances(Address::repeat_byte(0x99), &[a, b])
            .await
            .unwrap();

        assert_eq!(snapshot.get("a"), Some(U256::from(7u64)));
        assert_eq!(snapshot.get("b"), None);
        assert_eq!(snapshot.get(NATIVE_SYMBOL), Some(U256::from(5u64)));
        assert_eq!(snapshot.token_symbols().collect::<Vec<_>>(), vec!["a"]);
    }

    #[tokio::test]
    async fn native_is_always_present() {
        let chain = FakeChain::new(U256::ZERO);
        let snapshot = BalanceReader::new(&chain)
            .get_balances(Address::ZERO, &[])
            .await
            .unwrap();

        assert_eq!(snapshot.native(), U256::ZERO);
        assert_eq!(snapshot.get(NATIVE_SYMBOL), Some(U256::ZERO));
    }

    #[tokio::test]
    async fn native_read_failure_fails_snapshot() {
        let chain = FakeChain::new(U256::ZERO).with_failing_native();
        let result = BalanceReader::new(&chain)
            .get_balances(Address::ZERO, &[token("a", 0x0a)])
            .await;

        assert!(matches!(result, Err(Error::BalanceRead(_))));
    }
}
