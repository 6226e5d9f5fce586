//! Wallet session
//!
//! Owns the connected account. The account is never persisted: on startup it
//! is re-derived from the accounts the wallet has already authorized.

use std::sync::Arc;

use alloy_primitives::Address;
use serde_json::json;
use tokio::sync::watch;

use crate::chain_guard::ChainGuard;
use crate::provider::{parse_accounts, ProviderEvent, WalletProvider};
use crate::{Result, WavePortalError};

/// Outcome of applying a wallet notification to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    /// A (new) account is active, treat it as a fresh connection
    Connected(Address),
    /// The account went away
    Disconnected,
    /// Nothing the session cares about changed
    Unchanged,
}

/// Authorized handle for sending transactions from the session account
#[derive(Clone)]
pub struct Signer {
    provider: Arc<dyn WalletProvider>,
    address: Address,
}

impl Signer {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &dyn WalletProvider {
        self.provider.as_ref()
    }
}

pub struct WalletSession {
    /// `None` when no wallet is installed
    provider: Option<Arc<dyn WalletProvider>>,
    guard: ChainGuard,
    account: watch::Sender<Option<Address>>,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, guard: ChainGuard) -> Self {
        let (account, _) = watch::channel(None);
        Self {
            provider,
            guard,
            account,
        }
    }

    /// The wallet provider, or `NoProvider`
    pub fn provider(&self) -> Result<&Arc<dyn WalletProvider>> {
        self.provider.as_ref().ok_or(WavePortalError::NoProvider)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn guard(&self) -> &ChainGuard {
        &self.guard
    }

    /// Currently connected account
    pub fn account(&self) -> Option<Address> {
        *self.account.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.account().is_some()
    }

    /// Observe account changes
    pub fn watch_account(&self) -> watch::Receiver<Option<Address>> {
        self.account.subscribe()
    }

    /// Signer for the connected account, `NotConnected` if there is none
    pub fn signer(&self) -> Result<Signer> {
        let provider = self.provider()?.clone();
        let address = self.account().ok_or(WavePortalError::NotConnected)?;
        Ok(Signer { provider, address })
    }

    /// Look for an account the wallet has already authorized
    ///
    /// Uses `eth_accounts`, which never prompts. Returns `None` when there is
    /// no wallet or nothing is authorized yet.
    pub async fn check_existing_connection(&self) -> Result<Option<Address>> {
        let Some(provider) = self.provider.as_ref() else {
            log::info!("No wallet provider found, make sure you have MetaMask");
            return Ok(None);
        };

        let accounts = parse_accounts(provider.request("eth_accounts", json!([])).await?)?;
        match accounts.first() {
            Some(&account) => {
                log::info!("🔑 Found an authorized account: {}", account);
                self.set_account(Some(account));
                Ok(Some(account))
            }
            None => {
                log::info!("No authorized account found");
                Ok(None)
            }
        }
    }

    /// Interactive connect: pin the chain, then request account access
    pub async fn connect(&self) -> Result<Address> {
        let provider = self.provider()?;

        self.guard.ensure_network(provider.as_ref()).await?;

        let accounts = parse_accounts(provider.request("eth_requestAccounts", json!([])).await?)?;
        let account = *accounts.first().ok_or(WavePortalError::UserRejected)?;

        log::info!("✅ Connected {}", account);
        self.set_account(Some(account));
        Ok(account)
    }

    /// Drop the session account
    pub fn disconnect(&self) {
        if self.account.send_replace(None).is_some() {
            log::info!("🔌 Session disconnected");
        }
    }

    /// Apply a wallet notification, most recent event wins
    pub fn handle_event(&self, event: &ProviderEvent) -> SessionChange {
        match event {
            ProviderEvent::AccountsChanged(accounts) => match accounts.first() {
                Some(&account) => {
                    if self.set_account(Some(account)) {
                        log::info!("🔑 Account changed to {}", account);
                        SessionChange::Connected(account)
                    } else {
                        SessionChange::Unchanged
                    }
                }
                None => self.clear(),
            },
            ProviderEvent::Disconnect => self.clear(),
            ProviderEvent::ChainChanged(chain_id) => {
                log::debug!("Wallet chain changed to {}", chain_id);
                SessionChange::Unchanged
            }
        }
    }

    fn clear(&self) -> SessionChange {
        if self.set_account(None) {
            log::info!("🔌 Wallet released the account");
            SessionChange::Disconnected
        } else {
            SessionChange::Unchanged
        }
    }

    /// Returns whether the value changed
    fn set_account(&self, account: Option<Address>) -> bool {
        self.account.send_if_modified(|current| {
            if *current == account {
                false
            } else {
                *current = account;
                true
            }
        })
    }
}
