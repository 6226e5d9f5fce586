//! Wave Portal: wallet session and contract controller for the WavePortal dApp
//!
//! Connects a browser-style (EIP-1193) wallet, sends `wave` transactions to
//! the WavePortal contract and keeps a feed of waves that merges the
//! contract's history with live `NewWave` events.
//!
//! # Architecture
//!
//! - **ChainGuard**: keeps the wallet on the required chain, switching or
//!   registering it when needed
//! - **WalletSession**: the connected account, driven by connect calls and
//!   wallet notifications
//! - **ContractClient**: typed reads, the `wave` write and the live event
//!   listener
//! - **TransactionController**: one-at-a-time state machine for waves
//! - **WaveFeed**: history plus live events, replaced wholesale on reload
//! - **WavePortal**: owns all of the above for one mounted session
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wave_portal::{HttpWalletProvider, LogNotifier, PortalConfig, WavePortal};
//!
//! let provider = Arc::new(HttpWalletProvider::new("http://localhost:8545"));
//! let portal = WavePortal::new(Some(provider), Arc::new(LogNotifier), PortalConfig::from_build_env());
//!
//! portal.mount().await;
//! portal.connect().await?;
//! portal.set_message("hello");
//! portal.wave().await?;
//! ```

// Public modules
pub mod abi;
pub mod chain_guard;
pub mod config;
pub mod contract;
pub mod error;
pub mod feed;
pub mod http_provider;
pub mod notify;
pub mod portal;
pub mod provider;
pub mod record;
pub mod session;
pub mod state;
pub mod transaction;

// Re-exports for convenience
pub use chain_guard::ChainGuard;
pub use config::{NetworkRequirement, PortalConfig};
pub use contract::{ContractClient, PendingWave, TransactionReceipt, WaveSubscription};
pub use error::WavePortalError;
pub use feed::{ReloadTicket, WaveFeed};
pub use http_provider::HttpWalletProvider;
pub use notify::{LogNotifier, Notifier};
pub use portal::WavePortal;
pub use provider::{ProviderError, ProviderEvent, WalletProvider};
pub use record::{WaveBody, WaveRecord};
pub use session::{SessionChange, Signer, WalletSession};
pub use state::{MessageDraft, TotalWaves, TOTAL_UNKNOWN};
pub use transaction::{SubmitOutcome, TransactionController, TransactionState};

// Re-export commonly used primitive types
pub use alloy_primitives::{Address, B256, U256};

// Common result type
pub type Result<T> = std::result::Result<T, WavePortalError>;
