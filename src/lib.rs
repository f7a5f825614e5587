//! Dip-buying swap job
//!
//! On each invocation the job:
//! - Fetches the top tokens by volume on Base from CoinGecko
//! - Reads the wallet's balances
//! - Buys any token trading well under its trailing average, through a
//!   Uniswap V2 style router, when the quote clears a minimum output
//!
//! Nothing is kept between runs. Per-token failures are recorded as
//! [`executor::TradeOutcome`]s; only a missing token universe or native
//! balance aborts a run.

pub mod balances;
pub mod chain;
pub mod config;
pub mod executor;
pub mod market;
pub mod quote;
pub mod runner;
pub mod server;
pub mod tokens;
pub mod trend;
pub mod wallet;

mod error;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, RpcConfig};
pub use error::{Error, Result};
pub use executor::{SkipReason, TradeOutcome, TradeRecord};
pub use runner::{PipelineRunner, RunSummary};
