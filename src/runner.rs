//! Pipeline runner
//!
//! One pass: fetch universe → fetch balances → evaluate each token in
//! universe order. Tokens are processed strictly one after another so that a
//! single signing key never has two swaps in flight from this process.

use crate::balances::BalanceReader;
use crate::chain::{BalanceSource, SwapRouter};
use crate::config::Config;
use crate::executor::{ExecutorSettings, TradeExecutor, TradeRecord};
use crate::market::MarketData;
use crate::{Error, Result};
use alloy::primitives::Address;
use serde::Serialize;
use tracing::{info, Instrument};
use uuid::Uuid;

/// Externally visible result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub evaluated: usize,
    pub executed: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One per candidate token, in universe order
    pub records: Vec<TradeRecord>,
}

impl RunSummary {
    fn from_records(run_id: Uuid, records: Vec<TradeRecord>) -> Self {
        let executed = records.iter().filter(|r| r.outcome.is_executed()).count();
        let skipped = records.iter().filter(|r| r.outcome.is_skipped()).count();
        let failed = records.iter().filter(|r| r.outcome.is_failed()).count();
        Self {
            run_id,
            evaluated: records.len(),
            executed,
            skipped,
            failed,
            records,
        }
    }

    /// Human-readable one-liner
    pub fn message(&self) -> String {
        format!(
            "{} tokens evaluated: {} executed, {} skipped, {} failed",
            self.evaluated, self.executed, self.skipped, self.failed
        )
    }
}

/// Drives one end-to-end pass over injected collaborators
pub struct PipelineRunner<'a> {
    config: &'a Config,
    market: &'a dyn MarketData,
    balances: &'a dyn BalanceSource,
    router: &'a dyn SwapRouter,
    wallet: Address,
    dry_run: bool,
}

impl<'a> PipelineRunner<'a> {
    pub fn new(
        config: &'a Config,
        market: &'a dyn MarketData,
        balances: &'a dyn BalanceSource,
        router: &'a dyn SwapRouter,
        wallet: Address,
    ) -> Self {
        Self {
            config,
            market,
            balances,
            router,
            wallet,
            dry_run: false,
        }
    }

    /// Quote and gate but never submit
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Run the pipeline once. Only a missing universe or native balance is
    /// an error; every per-token problem ends up in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, dry_run = self.dry_run);
        self.run_inner(run_id).instrument(span).await
    }

    async fn run_inner(&self, run_id: Uuid) -> Result<RunSummary> {
        info!("Starting trade execution");
        let settings = self.settings()?;

        let mut tokens = self
            .market
            .list_top_tokens(self.config.market.page_size, &self.config.market.category)
            .await
            .map_err(|e| Error::fatal(format!("cannot fetch token universe: {}", e)))?;
        let page_size = self.config.market.page_size as usize;
        if tokens.len() > page_size {
            tracing::warn!(
                returned = tokens.len(),
                page_size,
                "Market data returned more tokens than requested, truncating"
            );
            tokens.truncate(page_size);
        }

        let snapshot = BalanceReader::new(self.balances)
            .get_balances(self.wallet, &tokens)
            .await
            .map_err(|e| Error::fatal(format!("cannot fetch balances: {}", e)))?;

        let executor = TradeExecutor::new(self.market, self.router, settings);
        let mut records = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let record = executor.evaluate(token, &snapshot).await;
            info!(symbol = %record.symbol, outcome = %record.outcome, "Token evaluated");
            records.push(record);
        }

        let summary = RunSummary::from_records(run_id, records);
        info!(
            executed = summary.executed,
            skipped = summary.skipped,
            failed = summary.failed,
            "{}",
            summary.message()
        );
        Ok(summary)
    }

    fn settings(&self) -> Result<ExecutorSettings> {
        Ok(ExecutorSettings {
            wallet: self.wallet,
            base_token: self.config.chain.base_token,
            min_profit: self.config.min_profit_wei()?,
            trend_window_days: self.config.strategy.trend_window_days,
            dip_ratio: self.config.strategy.dip_ratio,
            deadline_window: self.config.deadline_window(),
            dry_run: self.dry_run,
        })
    }
}
