//! In-memory fakes for the market and chain seams

use crate::chain::{BalanceSource, SwapRequest, SwapRouter};
use crate::market::{MarketData, PriceSeries};
use crate::tokens::Token;
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

pub fn token(symbol: &str, byte: u8) -> Token {
    Token::new(symbol, symbol, Address::repeat_byte(byte), 1_000.0)
}

/// Last sample 20% under a flat 100: a buy signal
pub fn dip_series() -> PriceSeries {
    PriceSeries::from_prices(&[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 80.0])
}

pub fn flat_series() -> PriceSeries {
    PriceSeries::from_prices(&[100.0, 100.0, 100.0, 100.0])
}

pub fn ether(milli: u64) -> U256 {
    U256::from(milli) * U256::from(1_000_000_000_000_000u64)
}

#[derive(Default)]
pub struct FakeMarket {
    tokens: Vec<Token>,
    universe_fails: bool,
    ignores_limit: bool,
    histories: HashMap<String, PriceSeries>,
    failing_histories: HashSet<String>,
    pub history_calls: Mutex<Vec<String>>,
}

impl FakeMarket {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    pub fn failing_universe() -> Self {
        Self {
            universe_fails: true,
            ..Default::default()
        }
    }

    /// Return the whole universe whatever limit is asked for
    pub fn ignoring_limit(mut self) -> Self {
        self.ignores_limit = true;
        self
    }

    pub fn with_history(mut self, token_id: &str, series: PriceSeries) -> Self {
        self.histories.insert(token_id.to_string(), series);
        self
    }

    pub fn with_failing_history(mut self, token_id: &str) -> Self {
        self.failing_histories.insert(token_id.to_string());
        self
    }

    pub fn history_call_count(&self) -> usize {
        self.history_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MarketData for FakeMarket {
    async fn list_top_tokens(&self, limit: u32, _category: &str) -> Result<Vec<Token>> {
        if self.universe_fails {
            return Err(Error::Provider("market data unavailable".to_string()));
        }
        if self.ignores_limit {
            return Ok(self.tokens.clone());
        }
        Ok(self.tokens.iter().take(limit as usize).cloned().collect())
    }

    async fn fetch_price_history(&self, token_id: &str, _window_days: u32) -> Result<PriceSeries> {
        self.history_calls.lock().unwrap().push(token_id.to_string());
        if self.failing_histories.contains(token_id) {
            return Err(Error::Provider(format!("history for {} unavailable", token_id)));
        }
        Ok(self.histories.get(token_id).cloned().unwrap_or_default())
    }
}

pub struct FakeChain {
    native: U256,
    native_fails: bool,
    token_balances: HashMap<Address, U256>,
    failing_balances: HashSet<Address>,
    quotes: HashMap<Address, U256>,
    failing_swaps: HashSet<Address>,
    yield_on_native: bool,
    /// "balance" / "swap" in call order, shared by every run
    pub events: Mutex<Vec<&'static str>>,
    pub quote_calls: Mutex<Vec<(U256, Vec<Address>)>>,
    pub swaps: Mutex<Vec<SwapRequest>>,
}

impl FakeChain {
    pub fn new(native: U256) -> Self {
        Self {
            native,
            native_fails: false,
            token_balances: HashMap::new(),
            failing_balances: HashSet::new(),
            quotes: HashMap::new(),
            failing_swaps: HashSet::new(),
            yield_on_native: false,
            events: Mutex::new(Vec::new()),
            quote_calls: Mutex::new(Vec::new()),
            swaps: Mutex::new(Vec::new()),
        }
    }

    pub fn with_failing_native(mut self) -> Self {
        self.native_fails = true;
        self
    }

    /// Suspend inside the native read so concurrent callers can interleave
    pub fn with_yielding_native(mut self) -> Self {
        self.yield_on_native = true;
        self
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn with_token_balance(mut self, token: Address, balance: U256) -> Self {
        self.token_balances.insert(token, balance);
        self
    }

    pub fn with_failing_balance(mut self, token: Address) -> Self {
        self.failing_balances.insert(token);
        self
    }

    /// Quote output for swaps into `target`; targets without one fail to quote
    pub fn with_quote(mut self, target: Address, amount_out: U256) -> Self {
        self.quotes.insert(target, amount_out);
        self
    }

    pub fn with_failing_swap(mut self, target: Address) -> Self {
        self.failing_swaps.insert(target);
        self
    }

    pub fn quote_call_count(&self) -> usize {
        self.quote_calls.lock().unwrap().len()
    }

    pub fn submitted(&self) -> Vec<SwapRequest> {
        self.swaps.lock().unwrap().clone()
    }
}

#[async_trait]
impl BalanceSource for FakeChain {
    async fn native_balance(&self, _owner: Address) -> Result<U256> {
        self.events.lock().unwrap().push("balance");
        if self.yield_on_native {
            tokio::task::yield_now().await;
        }
        if self.native_fails {
            return Err(Error::BalanceRead("rpc down".to_string()));
        }
        Ok(self.native)
    }

    async fn token_balance(&self, token: Address, _owner: Address) -> Result<U256> {
        if self.failing_balances.contains(&token) {
            return Err(Error::BalanceRead(format!("balanceOf on {} reverted", token)));
        }
        Ok(self.token_balances.get(&token).copied().unwrap_or_default())
    }
}

#[async_trait]
impl SwapRouter for FakeChain {
    async fn get_amounts_out(&self, amount_in: U256, path: &[Address]) -> Result<Vec<U256>> {
        self.quote_calls
            .lock()
            .unwrap()
            .push((amount_in, path.to_vec()));
        let target = path.last().copied().unwrap_or_default();
        match self.quotes.get(&target) {
            Some(out) => Ok(vec![amount_in, *out]),
            None => Err(Error::Quote(format!("no pair for {}", target))),
        }
    }

    async fn swap_exact_tokens_for_tokens(&self, request: &SwapRequest) -> Result<TxHash> {
        let target = request.path.last().copied().unwrap_or_default();
        if self.failing_swaps.contains(&target) {
            return Err(Error::Submission("execution reverted".to_string()));
        }
        self.events.lock().unwrap().push("swap");
        let mut swaps = self.swaps.lock().unwrap();
        swaps.push(request.clone());
        Ok(TxHash::repeat_byte(swaps.len() as u8))
    }
}
