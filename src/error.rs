//! Error types for wave portal operations
//!
//! One variant per failure class the controller distinguishes. Write-path
//! errors are surfaced to the user, read-path errors are logged and dropped
//! by the session object.

use thiserror::Error;

use crate::provider::{ProviderError, USER_REJECTED_REQUEST};

/// Core error type for wallet, network and contract operations
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum WavePortalError {
    /// No wallet provider was detected
    #[error("No wallet provider detected, install a browser wallet such as MetaMask")]
    NoProvider,

    /// The user declined a wallet prompt
    #[error("User rejected the request")]
    UserRejected,

    /// The wallet is on the wrong chain and switching or registering failed
    #[error("Network error: {0}")]
    Network(String),

    /// A wave was submitted but reverted, or failed before confirmation
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A contract read failed
    #[error("Read failed: {0}")]
    Read(String),

    /// A signer is required but no account is connected
    #[error("No account connected")]
    NotConnected,

    /// Any other error reported by the wallet provider
    #[error("Provider error {code}: {message}")]
    Provider { code: i64, message: String },

    /// Response could not be decoded
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

// Helper functions for common error scenarios
impl WavePortalError {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a read error
    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    /// Create a transaction failed error
    pub fn transaction_failed(msg: impl Into<String>) -> Self {
        Self::TransactionFailed(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Whether the user can recover by simply trying again
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NoProvider)
    }
}

impl From<ProviderError> for WavePortalError {
    fn from(err: ProviderError) -> Self {
        if err.code == USER_REJECTED_REQUEST {
            Self::UserRejected
        } else {
            Self::Provider {
                code: err.code,
                message: err.message,
            }
        }
    }
}

impl From<alloy_sol_types::Error> for WavePortalError {
    fn from(err: alloy_sol_types::Error) -> Self {
        Self::InvalidResponse(format!("ABI decoding failed: {}", err))
    }
}

impl From<serde_json::Error> for WavePortalError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(format!("JSON decoding failed: {}", err))
    }
}
