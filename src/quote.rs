//! Router quotes and the profitability gate
//!
//! A quote is advisory: it must clear [`ProfitGate`] before anything is
//! submitted.

use crate::chain::SwapRouter;
use crate::tokens::format_ether;
use crate::{Error, Result};
use alloy::primitives::{Address, U256};
use serde::Serialize;

/// Expected output for `amount_in` along `path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    pub path: Vec<Address>,
}

/// Asks the router for expected output amounts
pub struct QuoteEngine<'a> {
    router: &'a dyn SwapRouter,
}

impl<'a> QuoteEngine<'a> {
    pub fn new(router: &'a dyn SwapRouter) -> Self {
        Self { router }
    }

    /// Raw per-hop amounts from the router
    pub async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        if path.len() < 2 {
            return Err(Error::Quote(format!(
                "path needs at least two tokens, got {}",
                path.len()
            )));
        }
        self.router.get_amounts_out(amount_in, path).await
    }

    /// Quote the final token of `path`
    pub async fn quote(&self, amount_in: U256, path: Vec<Address>) -> Result<Quote> {
        let amounts = self.get_amounts_out(amount_in, &path).await?;
        let amount_out = amounts
            .last()
            .copied()
            .ok_or_else(|| Error::Quote("router returned no amounts".to_string()))?;

        Ok(Quote {
            amount_in,
            amount_out,
            path,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Block(String),
}

/// Blocks quotes whose output is under the minimum profit
#[derive(Debug, Clone, Copy)]
pub struct ProfitGate {
    min_profit: U256,
}

impl ProfitGate {
    pub fn new(min_profit: U256) -> Self {
        Self { min_profit }
    }

    pub fn min_profit(&self) -> U256 {
        self.min_profit
    }

    pub fn check(&self, quote: &Quote) -> GateDecision {
        if quote.amount_out < self.min_profit {
            return GateDecision::Block(format!(
                "expected output {} is below minimum {}",
                format_ether(quote.amount_out),
                format_ether(self.min_profit)
            ));
        }

        tracing::debug!(
            amount_out = %quote.amount_out,
            min_profit = %self.min_profit,
            "Profit check passed"
        );
        GateDecision::Allow
    }
}
