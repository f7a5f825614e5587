//! Per-token decision and swap submission
//!
//! ```text
//! Evaluating ─┬─ no native balance ────────────────► Skipped(NoBalance)
//!             ├─ trend not favorable ──────────────► Skipped(UnfavorableTrend)
//!             └─ Quoting ─┬─ quote error ──────────► Failed
//!                         ├─ below min profit ─────► Skipped(BelowProfitThreshold)
//!                         └─ Submitting ─┬─ ok ────► Executed(tx_hash)
//!                                        ├─ error ─► Failed
//!                                        └─ dry run► Skipped(DryRun)
//! ```
//!
//! Every failure is converted to an outcome at the token boundary; nothing
//! here returns an error to the runner.

use crate::balances::BalanceSnapshot;
use crate::chain::{SwapRequest, SwapRouter};
use crate::market::{MarketData, PriceSeries};
use crate::quote::{GateDecision, ProfitGate, Quote, QuoteEngine};
use crate::tokens::{format_ether, Token};
use crate::trend::{analyze_with_ratio, TradeSignal};
use alloy::primitives::{Address, TxHash, U256};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoBalance,
    UnfavorableTrend,
    BelowProfitThreshold,
    /// Would have submitted; carries the quoted output
    DryRun { amount_out: U256 },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoBalance => write!(f, "no native balance available"),
            SkipReason::UnfavorableTrend => write!(f, "current price is not favorable"),
            SkipReason::BelowProfitThreshold => write!(f, "profit threshold not met"),
            SkipReason::DryRun { amount_out } => {
                write!(f, "dry run, would swap for {}", format_ether(*amount_out))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TradeOutcome {
    Executed { tx_hash: TxHash },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeOutcome::Executed { tx_hash } => write!(f, "executed ({})", tx_hash),
            TradeOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
            TradeOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

impl TradeOutcome {
    fn skipped(reason: SkipReason) -> Self {
        TradeOutcome::Skipped { reason }
    }

    pub fn is_executed(&self) -> bool {
        matches!(self, TradeOutcome::Executed { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, TradeOutcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TradeOutcome::Failed { .. })
    }
}

/// Outcome for one token with the inputs that produced it
#[derive(Debug, Clone, Serialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub token: Address,
    pub outcome: TradeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<TradeSignal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
}

/// Fixed parameters of the decision
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Swap recipient and balance owner
    pub wallet: Address,
    pub base_token: Address,
    pub min_profit: U256,
    pub trend_window_days: u32,
    pub dip_ratio: f64,
    pub deadline_window: Duration,
    pub dry_run: bool,
}

pub struct TradeExecutor<'a> {
    market: &'a dyn MarketData,
    router: &'a dyn SwapRouter,
    gate: ProfitGate,
    settings: ExecutorSettings,
}

impl<'a> TradeExecutor<'a> {
    pub fn new(
        market: &'a dyn MarketData,
        router: &'a dyn SwapRouter,
        settings: ExecutorSettings,
    ) -> Self {
        Self {
            market,
            router,
            gate: ProfitGate::new(settings.min_profit),
            settings,
        }
    }

    /// Run one token through the state machine
    pub async fn evaluate(&self, token: &Token, balances: &BalanceSnapshot) -> TradeRecord {
        let mut record = TradeRecord {
            symbol: token.symbol.clone(),
            token: token.address,
            outcome: TradeOutcome::skipped(SkipReason::NoBalance),
            signal: None,
            quote: None,
        };

        let amount_in = balances.native();
        if amount_in.is_zero() {
            tracing::info!(symbol = %token.symbol, "No native balance available for trading, skipping");
            return record;
        }

        tracing::info!(symbol = %token.symbol, "Evaluating trade");
        let history = self.price_history(token).await;
        let signal = analyze_with_ratio(&history, self.settings.dip_ratio);
        record.signal = Some(signal);
        if !signal.should_trade {
            tracing::info!(
                symbol = %token.symbol,
                current_price = ?signal.current_price,
                average_price = ?signal.average_price,
                "Trade skipped: current price is not favorable"
            );
            record.outcome = TradeOutcome::skipped(SkipReason::UnfavorableTrend);
            return record;
        }

        let path = vec![self.settings.base_token, token.address];
        let quote = match QuoteEngine::new(self.router).quote(amount_in, path).await {
            Ok(quote) => quote,
            Err(e) => {
                tracing::error!(symbol = %token.symbol, error = %e, "Error quoting trade");
                record.outcome = TradeOutcome::Failed {
                    error: e.to_string(),
                };
                return record;
            }
        };
        tracing::info!(
            symbol = %token.symbol,
            amount_in = %format_ether(quote.amount_in),
            expected_out = %format_ether(quote.amount_out),
            "Quote received"
        );
        record.quote = Some(quote.clone());

        if let GateDecision::Block(reason) = self.gate.check(&quote) {
            tracing::info!(symbol = %token.symbol, reason = %reason, "Trade skipped: profit threshold not met");
            record.outcome = TradeOutcome::skipped(SkipReason::BelowProfitThreshold);
            return record;
        }

        if self.settings.dry_run {
            tracing::info!(symbol = %token.symbol, "Dry run, not submitting swap");
            record.outcome = TradeOutcome::skipped(SkipReason::DryRun {
                amount_out: quote.amount_out,
            });
            return record;
        }

        record.outcome = self.submit(token, quote).await;
        record
    }

    /// History failures degrade to an empty series, which never trades
    async fn price_history(&self, token: &Token) -> PriceSeries {
        match self
            .market
            .fetch_price_history(&token.id, self.settings.trend_window_days)
            .await
        {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(symbol = %token.symbol, error = %e, "Price history unavailable");
                PriceSeries::empty()
            }
        }
    }

    async fn submit(&self, token: &Token, quote: Quote) -> TradeOutcome {
        // Deadline is taken now, not when the quote was fetched.
        let request = SwapRequest {
            amount_in: quote.amount_in,
            amount_out_min: self.gate.min_profit(),
            path: quote.path,
            to: self.settings.wallet,
            deadline: unix_now().saturating_add(self.settings.deadline_window.as_secs()),
        };

        match self.router.swap_exact_tokens_for_tokens(&request).await {
            Ok(tx_hash) => {
                tracing::info!(symbol = %token.symbol, tx_hash = %tx_hash, "Trade executed");
                TradeOutcome::Executed { tx_hash }
            }
            Err(e) => {
                tracing::error!(symbol = %token.symbol, error = %e, "Error executing trade");
                TradeOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
