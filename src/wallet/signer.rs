//! Signing key holder
//!
//! SECURITY: This is the ONLY place where the private key exists.
//! - The raw key is held in a `SecretString` until parsed
//! - The parsed key lives in alloy's PrivateKeySigner
//! - Keys are never serialized or logged

use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

/// Wallet that owns the job's signing key
pub struct SecureWallet {
    address: Address,
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Create a wallet from an environment variable
    pub fn from_env(var_name: &str) -> Result<Self> {
        let key = std::env::var(var_name).map_err(|_| {
            Error::Wallet(format!(
                "Environment variable {} not set. Required for wallet initialization.",
                var_name
            ))
        })?;

        Self::from_secret(&SecretString::from(key))
    }

    /// Create a wallet from a hex-encoded private key, with or without `0x`
    pub fn from_secret(key: &SecretString) -> Result<Self> {
        let key_hex = key.expose_secret().trim();
        if key_hex.is_empty() {
            return Err(Error::Wallet("Private key is empty".to_string()));
        }
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Wallet(format!("Invalid private key: {}", e)))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self { address, wallet })
    }

    /// Public address; the swap recipient and balance owner
    pub fn address(&self) -> Address {
        self.address
    }

    /// Signing wallet for alloy providers. Does not expose the raw key.
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
