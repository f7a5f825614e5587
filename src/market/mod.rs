//! Market data: token universe and price history
//!
//! The [`MarketData`] trait is the seam the pipeline depends on. The
//! production source is [`CoinGeckoClient`], which degrades provider failures
//! to empty results so that one token's data outage never aborts a run.

mod coingecko;

pub use coingecko::CoinGeckoClient;

use crate::tokens::Token;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One price sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

/// Price samples ascending by timestamp over a trailing window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp_ms);
        Self { points }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a series from bare prices, one sample per hour ending now-ish.
    /// Handy for fixtures and the CLI.
    pub fn from_prices(prices: &[f64]) -> Self {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, &price)| PricePoint {
                timestamp_ms: i as i64 * 3_600_000,
                price,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn prices(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.price)
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Source of the token universe and price history
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Top tokens by volume in `category`, at most `limit`, in provider order.
    ///
    /// An `Err` here means the universe cannot be obtained at all and aborts
    /// the run. Transient provider failures should come back as `Ok(vec![])`.
    async fn list_top_tokens(&self, limit: u32, category: &str) -> Result<Vec<Token>>;

    /// Price history for `token_id` over the trailing `window_days`
    async fn fetch_price_history(&self, token_id: &str, window_days: u32) -> Result<PriceSeries>;
}
