//! Signing wallet
//!
//! Loads the private key once at startup. The key never leaves this module.

mod signer;

pub use signer::SecureWallet;
