//! Error types for the swap job

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data provider error: {0}")]
    Provider(String),

    #[error("Balance read failed: {0}")]
    BalanceRead(String),

    #[error("Quote failed: {0}")]
    Quote(String),

    #[error("Swap submission failed: {0}")]
    Submission(String),

    #[error("Pipeline aborted: {0}")]
    PipelineFatal(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any failure that makes the whole run meaningless.
    pub fn fatal(err: impl std::fmt::Display) -> Self {
        Error::PipelineFatal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
