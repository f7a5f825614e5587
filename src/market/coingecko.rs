//! CoinGecko REST client
//!
//! Uses three public endpoints:
//! - `/coins/markets` for the top tokens of a category by volume
//! - `/coins/{id}` for a token's Base contract address (`platforms.base`),
//!   which market rows do not carry
//! - `/coins/{id}/market_chart` for the trailing price history
//!
//! Provider failures (network, timeout, non-2xx including 429, malformed
//! bodies) are logged and degraded to empty results.

use super::{MarketData, PricePoint, PriceSeries};
use crate::config::{Config, COINGECKO_API_KEY_ENV};
use crate::tokens::Token;
use crate::{Error, Result};
use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko asset platform id of Base
const BASE_PLATFORM: &str = "base";

/// Market data client for CoinGecko
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    vs_currency: String,
    api_key: Option<String>,
}

/// Row of `/coins/markets`
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    /// Only present on some proxies of the API; otherwise resolved per coin
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    total_volume: Option<f64>,
}

/// Subset of `/coins/{id}`
#[derive(Debug, Deserialize)]
struct CoinDetail {
    #[serde(default)]
    platforms: HashMap<String, Option<String>>,
}

impl CoinDetail {
    fn base_address(&self) -> Option<&str> {
        self.platforms
            .get(BASE_PLATFORM)
            .and_then(|address| address.as_deref())
            .filter(|address| !address.is_empty())
    }
}

/// Body of `/coins/{id}/market_chart`
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(f64, f64)>,
}

impl CoinGeckoClient {
    /// Create a client from the market section of the config
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.market.api_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid market data URL {:?}: {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            vs_currency: config.market.vs_currency.clone(),
            api_key: std::env::var(COINGECKO_API_KEY_ENV).ok(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.get(format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }

    /// Connectivity probe
    pub async fn ping(&self) -> Result<()> {
        self.get("/ping").send().await?.error_for_status()?;
        Ok(())
    }

    /// Fetch the universe, surfacing every provider failure
    pub async fn try_list_top_tokens(&self, limit: u32, category: &str) -> Result<Vec<Token>> {
        let per_page = limit.to_string();
        let rows: Vec<MarketRow> = self
            .get("/coins/markets")
            .query(&[
                ("vs_currency", self.vs_currency.as_str()),
                ("order", "volume_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("category", category),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let limit = limit as usize;
        let mut tokens = Vec::with_capacity(limit.min(rows.len()));
        for row in rows {
            if tokens.len() >= limit {
                break;
            }
            if let Some(address) = self.row_address(&row).await {
                tokens.push(Token::new(
                    row.id,
                    row.symbol,
                    address,
                    row.total_volume.unwrap_or(0.0),
                ));
            }
        }
        Ok(tokens)
    }

    /// Base contract address listed for a coin, if any
    pub async fn try_fetch_base_address(&self, token_id: &str) -> Result<Option<String>> {
        check_token_id(token_id)?;
        let detail: CoinDetail = self
            .get(&format!("/coins/{}", token_id))
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("market_data", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
                ("sparkline", "false"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(detail.base_address().map(str::to_string))
    }

    /// A row that cannot be placed on Base is dropped, never fatal
    async fn row_address(&self, row: &MarketRow) -> Option<Address> {
        if let Some(raw) = row.contract_address.as_deref().filter(|s| !s.is_empty()) {
            return parse_address(&row.id, raw);
        }
        match self.try_fetch_base_address(&row.id).await {
            Ok(Some(raw)) => parse_address(&row.id, &raw),
            Ok(None) => {
                tracing::warn!(id = %row.id, "Token has no Base contract address, dropping");
                None
            }
            Err(e) => {
                tracing::warn!(id = %row.id, error = %e, "Could not resolve contract address, dropping");
                None
            }
        }
    }

    /// Fetch a price history, surfacing every provider failure
    pub async fn try_fetch_price_history(
        &self,
        token_id: &str,
        window_days: u32,
    ) -> Result<PriceSeries> {
        check_token_id(token_id)?;

        let days = window_days.to_string();
        let chart: MarketChart = self
            .get(&format!("/coins/{}/market_chart", token_id))
            .query(&[("vs_currency", self.vs_currency.as_str()), ("days", days.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(series_from_chart(chart))
    }
}

fn check_token_id(token_id: &str) -> Result<()> {
    if token_id.is_empty() || token_id.contains('/') {
        return Err(Error::Provider(format!("Invalid token id {:?}", token_id)));
    }
    Ok(())
}

fn parse_address(id: &str, raw: &str) -> Option<Address> {
    match Address::from_str(raw) {
        Ok(address) => Some(address),
        Err(e) => {
            tracing::warn!(id, address = raw, error = %e, "Invalid contract address, dropping");
            None
        }
    }
}

fn series_from_chart(chart: MarketChart) -> PriceSeries {
    PriceSeries::new(
        chart
            .prices
            .into_iter()
            .filter(|(_, price)| price.is_finite())
            .map(|(ts, price)| PricePoint {
                timestamp_ms: ts as i64,
                price,
            })
            .collect(),
    )
}

fn degrades(err: &Error) -> bool {
    matches!(err, Error::Provider(_) | Error::Network(_) | Error::Json(_))
}

#[async_trait]
impl MarketData for CoinGeckoClient {
    async fn list_top_tokens(&self, limit: u32, category: &str) -> Result<Vec<Token>> {
        tracing::info!(limit, category, "Fetching top tokens by volume");
        match self.try_list_top_tokens(limit, category).await {
            Ok(tokens) => {
                let symbols: Vec<&str> = tokens.iter().map(|t| t.symbol.as_str()).collect();
                tracing::info!(count = tokens.len(), symbols = ?symbols, "Top tokens fetched");
                Ok(tokens)
            }
            Err(e) if degrades(&e) => {
                tracing::error!(error = %e, "Error fetching top tokens");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_price_history(&self, token_id: &str, window_days: u32) -> Result<PriceSeries> {
        tracing::debug!(token_id, window_days, "Fetching price history");
        match self.try_fetch_price_history(token_id, window_days).await {
            Ok(series) => {
                tracing::debug!(token_id, samples = series.len(), "Price history fetched");
                Ok(series)
            }
            Err(e) if degrades(&e) => {
                tracing::error!(token_id, error = %e, "Error fetching price history");
                Ok(PriceSeries::empty())
            }
            Err(e) => Err(e),
        }
    }
}
