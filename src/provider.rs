//! Wallet provider boundary (EIP-1193)
//!
//! The controller never talks to a wallet directly. Everything goes through
//! [`WalletProvider::request`], and unsolicited wallet notifications arrive on
//! the channel returned by [`WalletProvider::subscribe`].

use alloy_primitives::Address;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::{Result, WavePortalError};

/// The user rejected the request (EIP-1193)
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// The provider does not support the requested method (EIP-1193)
pub const UNSUPPORTED_METHOD: i64 = 4200;

/// The requested chain has not been added to the wallet (EIP-3326)
pub const UNRECOGNIZED_CHAIN: i64 = 4902;

/// JSON-RPC internal error
pub const INTERNAL_ERROR: i64 = -32603;

/// Error object returned by a wallet provider
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("{message} (code {code})")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    pub fn unrecognized_chain(chain_id: u64) -> Self {
        Self::new(
            UNRECOGNIZED_CHAIN,
            format!("Unrecognized chain ID \"{}\".", format_chain_id(chain_id)),
        )
    }
}

/// Notification pushed by the wallet outside of any request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    /// `accountsChanged`, an empty list means the wallet locked or revoked access
    AccountsChanged(Vec<Address>),
    /// `chainChanged`
    ChainChanged(u64),
    /// `disconnect`
    Disconnect,
}

/// An injected wallet such as MetaMask
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `provider.request({ method, params })`
    async fn request(&self, method: &str, params: Value) -> std::result::Result<Value, ProviderError>;

    /// Register for wallet notifications
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Hex chain id as wallets expect it (`0x4`)
pub fn format_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Parse a JSON-RPC hex quantity (`"0x1a"`) into a `u64`
pub fn parse_quantity(value: &Value) -> Result<u64> {
    let text = value
        .as_str()
        .ok_or_else(|| WavePortalError::invalid_response(format!("expected hex quantity, got {}", value)))?;
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .ok_or_else(|| WavePortalError::invalid_response(format!("quantity without 0x prefix: {}", text)))?;
    if digits.is_empty() {
        return Err(WavePortalError::invalid_response("empty hex quantity"));
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| WavePortalError::invalid_response(format!("bad hex quantity {}: {}", text, e)))
}

/// Decode an account list as returned by `eth_accounts` / `eth_requestAccounts`
pub fn parse_accounts(value: Value) -> Result<Vec<Address>> {
    Ok(serde_json::from_value(value)?)
}
