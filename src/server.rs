//! HTTP trigger
//!
//! `GET /api/bot` runs the pipeline once and answers `{ "message": ... }`
//! (200) or `{ "error": ... }` (500). Runs are serialized behind a mutex so
//! overlapping requests never submit from the same key concurrently.

use crate::chain::{BalanceSource, RpcChain, SwapRouter};
use crate::config::{Config, RpcConfig, PRIVATE_KEY_ENV};
use crate::market::{CoinGeckoClient, MarketData};
use crate::runner::{PipelineRunner, RunSummary};
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::primitives::Address;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

/// Everything a run needs, built once at startup
pub struct AppState {
    pub config: Config,
    market: Arc<dyn MarketData>,
    balances: Arc<dyn BalanceSource>,
    router: Arc<dyn SwapRouter>,
    wallet: Address,
    run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        config: Config,
        market: Arc<dyn MarketData>,
        balances: Arc<dyn BalanceSource>,
        router: Arc<dyn SwapRouter>,
        wallet: Address,
    ) -> Self {
        Self {
            config,
            market,
            balances,
            router,
            wallet,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire the production collaborators. Fails if no signing context can
    /// be built.
    pub async fn connect(config: Config) -> Result<Self> {
        let wallet = SecureWallet::from_env(PRIVATE_KEY_ENV).map_err(Error::fatal)?;
        tracing::info!(address = %wallet.address(), "Loaded wallet from {}", PRIVATE_KEY_ENV);

        let rpc = RpcConfig::from_env();
        tracing::info!(rpc = rpc.url(), router = %config.chain.router, "Connecting to Base");
        let chain = Arc::new(RpcChain::with_wallet(&rpc, config.chain.router, &wallet)?);

        let market = CoinGeckoClient::new(&config)?;
        match market.ping().await {
            Ok(()) => tracing::info!("Market data provider reachable"),
            Err(e) => tracing::warn!(error = %e, "Market data provider ping failed"),
        }

        Ok(Self::new(
            config,
            Arc::new(market),
            chain.clone(),
            chain,
            wallet.address(),
        ))
    }

    /// Run the pipeline once, waiting for any run already in progress
    pub async fn run_once(&self, dry_run: bool) -> Result<RunSummary> {
        let _guard = self.run_lock.lock().await;
        PipelineRunner::new(
            &self.config,
            self.market.as_ref(),
            self.balances.as_ref(),
            self.router.as_ref(),
            self.wallet,
        )
        .with_dry_run(dry_run)
        .run()
        .await
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Pipeline-fatal failure as an HTTP response
#[derive(Debug)]
pub struct ApiError(Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RunParams {
    #[serde(default)]
    pub dry_run: bool,
}

pub async fn run_bot_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunParams>,
) -> std::result::Result<Json<Message>, ApiError> {
    tracing::info!(dry_run = params.dry_run, "Bot triggered");
    match state.run_once(params.dry_run).await {
        Ok(summary) => Ok(Json(Message {
            message: summary.message(),
        })),
        Err(e) => {
            tracing::error!(error = %e, "Error in bot execution");
            Err(e.into())
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    Json(Message {
        message: "ok".to_string(),
    })
}

pub fn make_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/bot", get(run_bot_handler))
        .route("/api/health", get(health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(state: Arc<AppState>, bind: &str) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .map_err(|e| Error::Server(format!("Cannot bind {}: {}", bind, e)))?;
    tracing::info!(bind, "Server started");
    axum::serve(listener, make_app(state))
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dip_series, ether, token, FakeChain, FakeMarket};
    use alloy::primitives::U256;

    fn state(market: FakeMarket, chain: FakeChain) -> Arc<AppState> {
        let chain = Arc::new(chain);
        Arc::new(AppState::new(
            Config::default(),
            Arc::new(market),
            chain.clone(),
            chain,
            Address::ZERO,
        ))
    }

    #[tokio::test]
    async fn success_returns_summary_message() {
        let a = token("a", 0x0a);
        let market = FakeMarket::new(vec![a.clone()]).with_history("a", dip_series());
        let chain = FakeChain::new(ether(10)).with_quote(a.address, ether(5));

        let Json(body) = run_bot_handler(
            State(state(market, chain)),
            Query(RunParams::default()),
        )
        .await
        .unwrap();

        assert_eq!(
            body.message,
            "1 tokens evaluated: 1 executed, 0 skipped, 0 failed"
        );
    }

    #[tokio::test]
    async fn all_skipped_is_still_success() {
        let market = FakeMarket::new(vec![token("a", 0x0a)]);
        let chain = FakeChain::new(U256::ZERO);

        let result = run_bot_handler(State(state(market, chain)), Query(RunParams::default())).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn fatal_error_is_500_with_error_body() {
        let market = FakeMarket::failing_universe();
        let chain = FakeChain::new(ether(10));

        let err = run_bot_handler(State(state(market, chain)), Query(RunParams::default()))
            .await
            .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn bind_failure_is_server_error() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = taken.local_addr().unwrap().to_string();
        let state = state(FakeMarket::new(Vec::new()), FakeChain::new(ether(10)));

        let err = serve(state, &addr).await.unwrap_err();
        assert!(matches!(err, Error::Server(_)));
    }

    #[tokio::test]
    async fn concurrent_triggers_run_one_after_another() {
        let a = token("a", 0x0a);
        let market = FakeMarket::new(vec![a.clone()]).with_history("a", dip_series());
        let chain = Arc::new(
            FakeChain::new(ether(10))
                .with_quote(a.address, ether(5))
                .with_yielding_native(),
        );
        let state = AppState::new(
            Config::default(),
            Arc::new(market),
            chain.clone(),
            chain.clone(),
            Address::ZERO,
        );

        let (first, second) = tokio::join!(state.run_once(false), state.run_once(false));
        assert_eq!(first.unwrap().executed, 1);
        assert_eq!(second.unwrap().executed, 1);
        assert_eq!(chain.events(), vec!["balance", "swap", "balance", "swap"]);
    }
}
