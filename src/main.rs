//! Dip-swap bot CLI
//!
//! `run` executes one pass and prints the same JSON body the HTTP trigger
//! returns; `serve` exposes that pass as `GET /api/bot`.

use alloy::primitives::{Address, U256};
use clap::{Parser, Subcommand};
use dip_swap_bot::chain::RpcChain;
use dip_swap_bot::quote::QuoteEngine;
use dip_swap_bot::server::{self, AppState, ErrorBody, Message};
use dip_swap_bot::tokens::format_ether;
use dip_swap_bot::{Config, Error, Result, RpcConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "dip-swap-bot")]
#[command(about = "Stateless dip-buying swap job for Base")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once
    Run {
        /// Quote and gate, but don't submit swaps
        #[arg(long)]
        dry_run: bool,
    },

    /// Serve the HTTP trigger
    Serve {
        /// Listen address (overrides config)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Quote base token -> token through the router
    Quote {
        /// Target token address
        #[arg(long)]
        token: String,

        /// Amount of base token in wei (defaults to 1 ETH)
        #[arg(long)]
        amount: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Exiting with error");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(path) => Config::from_file(&path)?,
        None => Config::default(),
    }
    .with_env_overrides();
    config.validate()?;

    match cli.command {
        Commands::Run { dry_run } => run_pipeline(config, dry_run).await,
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let state = Arc::new(AppState::connect(config).await?);
            server::serve(state, &bind).await
        }
        Commands::Quote { token, amount } => run_quote(config, token, amount).await,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn run_pipeline(config: Config, dry_run: bool) -> Result<()> {
    tracing::info!(dry_run, "Bot triggered");

    let result = match AppState::connect(config).await {
        Ok(state) => state.run_once(dry_run).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            let body = Message {
                message: summary.message(),
            };
            println!("{}", serde_json::to_string(&body)?);
            tracing::debug!(records = %serde_json::to_string(&summary.records)?, "Run details");
            Ok(())
        }
        Err(e) => {
            let body = ErrorBody {
                error: e.to_string(),
            };
            println!("{}", serde_json::to_string(&body)?);
            Err(e)
        }
    }
}

async fn run_quote(config: Config, token: String, amount: Option<String>) -> Result<()> {
    let target = Address::from_str(&token)
        .map_err(|e| Error::InvalidArgument(format!("Invalid token address: {}", e)))?;
    let amount_in = match amount {
        Some(raw) => U256::from_str(&raw)
            .map_err(|e| Error::InvalidArgument(format!("Invalid amount: {}", e)))?,
        None => U256::from(10u64).pow(U256::from(18u64)),
    };

    let rpc = RpcConfig::from_env();
    let chain = RpcChain::read_only(&rpc, config.chain.router)?;
    let path = [config.chain.base_token, target];

    tracing::info!(token = %target, amount_in = %amount_in, "Requesting quote");
    let amounts = QuoteEngine::new(&chain).get_amounts_out(amount_in, &path).await?;
    let amount_out = amounts.last().copied().unwrap_or_default();
    let min_profit = config.min_profit_wei()?;

    let report = serde_json::json!({
        "path": path,
        "amount_in": amount_in.to_string(),
        "amounts_out": amounts.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        "amount_out_formatted": format_ether(amount_out),
        "clears_min_profit": amount_out >= min_profit,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
