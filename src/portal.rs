//! Wave portal session object
//!
//! Owns every piece of session state (account, total, feed, draft,
//! transaction) and the long-lived resources: one live `NewWave` listener and
//! one task draining wallet notifications. Created on mount, torn down on
//! unmount.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::Address;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::chain_guard::ChainGuard;
use crate::config::PortalConfig;
use crate::contract::{ContractClient, WaveSubscription};
use crate::feed::WaveFeed;
use crate::notify::{notify_failure, Notifier};
use crate::provider::WalletProvider;
use crate::record::WaveRecord;
use crate::session::{SessionChange, WalletSession};
use crate::state::{MessageDraft, TotalWaves};
use crate::transaction::{SubmitOutcome, TransactionController, TransactionState};
use crate::Result;

/// Resources held while mounted
#[derive(Default)]
struct Mounted {
    subscription: Option<WaveSubscription>,
    events: Option<JoinHandle<()>>,
}

pub struct WavePortal {
    session: Arc<WalletSession>,
    contract: Arc<ContractClient>,
    feed: Arc<WaveFeed>,
    totals: Arc<TotalWaves>,
    draft: Arc<MessageDraft>,
    transactions: TransactionController,
    notifier: Arc<dyn Notifier>,
    mounted: Mutex<Mounted>,
}

impl WavePortal {
    /// Build a portal, `provider` is `None` when no wallet is installed
    pub fn new(
        provider: Option<Arc<dyn WalletProvider>>,
        notifier: Arc<dyn Notifier>,
        config: PortalConfig,
    ) -> Arc<Self> {
        let guard = ChainGuard::new(config.network.clone());
        let session = Arc::new(WalletSession::new(provider, guard));
        let contract = Arc::new(ContractClient::new(session.clone(), &config));
        let totals = Arc::new(TotalWaves::new());
        let feed = Arc::new(WaveFeed::new());
        let draft = Arc::new(MessageDraft::new());
        let transactions = TransactionController::new(
            session.clone(),
            contract.clone(),
            totals.clone(),
            feed.clone(),
            draft.clone(),
            notifier.clone(),
        );

        Arc::new(Self {
            session,
            contract,
            feed,
            totals,
            draft,
            transactions,
            notifier,
            mounted: Mutex::new(Mounted::default()),
        })
    }

    /// Start the session
    ///
    /// Registers the live listener and the wallet notification task, then
    /// picks up an already-authorized account (which loads count and feed).
    /// Mounting again replaces the previous listener.
    pub async fn mount(self: &Arc<Self>) -> Option<Address> {
        self.unmount();

        if let Ok(provider) = self.session.provider() {
            let events = self.spawn_event_loop(provider.as_ref());
            self.lock_mounted().events = Some(events);

            let feed = self.feed.clone();
            match self.contract.subscribe_new_wave(move |record| feed.push(record)).await {
                Ok(subscription) => self.lock_mounted().subscription = Some(subscription),
                Err(e) => log::warn!("Could not subscribe to NewWave: {}", e),
            }
        }

        self.check_existing_connection().await
    }

    /// Release the listener and stop reacting to wallet notifications
    pub fn unmount(&self) {
        let mut mounted = self.lock_mounted();
        if let Some(subscription) = mounted.subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(events) = mounted.events.take() {
            events.abort();
        }
    }

    /// Non-interactive: reuse an already-authorized account if there is one
    pub async fn check_existing_connection(&self) -> Option<Address> {
        match self.session.check_existing_connection().await {
            Ok(Some(account)) => {
                self.notifier.success(&format!("{} connected", account));
                self.refresh().await;
                Some(account)
            }
            Ok(None) => None,
            Err(e) => {
                log::error!("Checking existing connection failed: {}", e);
                self.notifier.error(&e.to_string());
                None
            }
        }
    }

    /// Interactive connect, then load count and feed
    pub async fn connect(&self) -> Result<Address> {
        match self.session.connect().await {
            Ok(account) => {
                self.notifier.success(&format!("{} connected", account));
                self.refresh().await;
                Ok(account)
            }
            Err(e) => {
                notify_failure(self.notifier.as_ref(), &e);
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Reload count and feed, read failures keep the stale values
    pub async fn refresh(&self) {
        tokio::join!(self.totals.refresh(&self.contract), self.reload_feed());
    }

    /// Full feed reload
    pub async fn reload_feed(&self) -> bool {
        self.feed.reload(&self.contract).await
    }

    /// Submit the current draft
    pub async fn wave(&self) -> Result<SubmitOutcome> {
        let message = self.draft.get();
        self.transactions.submit(&message).await
    }

    /// Submit an explicit message
    pub async fn wave_message(&self, message: &str) -> Result<SubmitOutcome> {
        self.transactions.submit(message).await
    }

    pub fn set_message(&self, text: impl Into<String>) {
        self.draft.set(text);
    }

    pub fn message(&self) -> String {
        self.draft.get()
    }

    pub fn account(&self) -> Option<Address> {
        self.session.account()
    }

    /// Raw total with the `-1` sentinel
    pub fn total_waves(&self) -> i64 {
        self.totals.raw()
    }

    /// Feed in display order
    pub fn waves(&self) -> Vec<WaveRecord> {
        self.feed.newest_first()
    }

    pub fn transaction_state(&self) -> TransactionState {
        self.transactions.state()
    }

    pub fn is_mining(&self) -> bool {
        self.transactions.is_mining()
    }

    pub fn is_listening(&self) -> bool {
        self.lock_mounted()
            .subscription
            .as_ref()
            .is_some_and(WaveSubscription::is_active)
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn contract(&self) -> &ContractClient {
        &self.contract
    }

    pub fn feed(&self) -> &WaveFeed {
        &self.feed
    }

    pub fn totals(&self) -> &TotalWaves {
        &self.totals
    }

    pub fn transactions(&self) -> &TransactionController {
        &self.transactions
    }

    /// Single consumer of wallet notifications
    fn spawn_event_loop(self: &Arc<Self>, provider: &dyn WalletProvider) -> JoinHandle<()> {
        let mut events = provider.subscribe();
        let portal = Arc::downgrade(self);

        tokio::spawn(async move {
            loop {
                let event = match events.recv().await {
                    Ok(event) => event,
                    Err(RecvError::Lagged(skipped)) => {
                        log::warn!("Dropped {} wallet notifications", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(portal) = portal.upgrade() else { break };

                match portal.session.handle_event(&event) {
                    SessionChange::Connected(account) => {
                        portal.notifier.success(&format!("{} connected", account));
                        portal.refresh().await;
                    }
                    SessionChange::Disconnected => log::info!("Wallet disconnected"),
                    SessionChange::Unchanged => {}
                }
            }
        })
    }

    fn lock_mounted(&self) -> MutexGuard<'_, Mounted> {
        self.mounted.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for WavePortal {
    fn drop(&mut self) {
        self.unmount();
    }
}
