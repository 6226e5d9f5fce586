//! Wave transaction state machine
//!
//! `Idle -> Submitting -> Pending(hash) -> Confirmed | Failed -> Idle`
//!
//! At most one wave is in flight per session. A submit while anything but
//! `Idle` is a no-op.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::B256;
use tokio::sync::broadcast;

use crate::contract::ContractClient;
use crate::feed::WaveFeed;
use crate::notify::{notify_failure, Notifier};
use crate::session::WalletSession;
use crate::state::{MessageDraft, TotalWaves};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionState {
    Idle,
    /// Waiting for the wallet to sign and hand back a hash
    Submitting,
    /// Submitted, waiting to be mined
    Pending(B256),
    Confirmed,
    Failed(String),
}

impl TransactionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What a `submit` call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Another wave was already in flight
    Ignored,
    /// Mined successfully
    Confirmed(B256),
}

pub struct TransactionController {
    session: Arc<WalletSession>,
    contract: Arc<ContractClient>,
    totals: Arc<TotalWaves>,
    feed: Arc<WaveFeed>,
    draft: Arc<MessageDraft>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<TransactionState>,
    transitions: broadcast::Sender<TransactionState>,
}

impl TransactionController {
    pub fn new(
        session: Arc<WalletSession>,
        contract: Arc<ContractClient>,
        totals: Arc<TotalWaves>,
        feed: Arc<WaveFeed>,
        draft: Arc<MessageDraft>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (transitions, _) = broadcast::channel(64);
        Self {
            session,
            contract,
            totals,
            feed,
            draft,
            notifier,
            state: Mutex::new(TransactionState::Idle),
            transitions,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.lock_state().clone()
    }

    /// True while a submitted wave is being mined
    pub fn is_mining(&self) -> bool {
        matches!(*self.lock_state(), TransactionState::Pending(_))
    }

    /// Every state transition, in order
    pub fn subscribe(&self) -> broadcast::Receiver<TransactionState> {
        self.transitions.subscribe()
    }

    /// Submit a wave and wait for it to be mined
    ///
    /// Connects first when no account is present. Failures are reported to
    /// the notifier and returned. If the returned future is dropped midway
    /// the controller goes back to `Idle`.
    pub async fn submit(&self, message: &str) -> Result<SubmitOutcome> {
        if !self.try_begin() {
            log::debug!("Wave already in flight, ignoring submit");
            return Ok(SubmitOutcome::Ignored);
        }
        let mut in_flight = InFlight { controller: self, done: false };

        let outcome = match self.run(message).await {
            Ok(tx_hash) => {
                self.transition(TransactionState::Confirmed);
                self.totals.refresh(&self.contract).await;
                self.draft.clear();
                self.notifier.success("Waved");
                self.transition(TransactionState::Idle);
                Ok(SubmitOutcome::Confirmed(tx_hash))
            }
            Err(e) => {
                log::error!("❌ Wave failed: {}", e);
                self.transition(TransactionState::Failed(e.to_string()));
                notify_failure(self.notifier.as_ref(), &e);
                self.transition(TransactionState::Idle);
                Err(e)
            }
        };
        in_flight.done = true;
        outcome
    }

    async fn run(&self, message: &str) -> Result<B256> {
        if self.session.is_connected() {
            self.totals.refresh(&self.contract).await;
        } else {
            // Fresh session: load count and history like an explicit connect
            let account = self.session.connect().await?;
            self.notifier.success(&format!("{} connected", account));
            tokio::join!(self.totals.refresh(&self.contract), self.feed.reload(&self.contract));
        }

        let pending = self.contract.wave(message).await?;
        let tx_hash = pending.tx_hash();
        self.transition(TransactionState::Pending(tx_hash));
        log::info!("⛏️  Mining... {}", tx_hash);

        pending.wait().await?;
        log::info!("   ✅ Mined -- {}", tx_hash);
        Ok(tx_hash)
    }

    /// Atomically move `Idle -> Submitting`
    fn try_begin(&self) -> bool {
        let mut state = self.lock_state();
        if !state.is_idle() {
            return false;
        }
        *state = TransactionState::Submitting;
        drop(state);
        let _ = self.transitions.send(TransactionState::Submitting);
        true
    }

    fn transition(&self, next: TransactionState) {
        *self.lock_state() = next.clone();
        let _ = self.transitions.send(next);
    }

    fn lock_state(&self) -> MutexGuard<'_, TransactionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Resets the controller if a submit is abandoned before it is back to `Idle`
struct InFlight<'a> {
    controller: &'a TransactionController,
    done: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.done {
            log::warn!("Wave submission abandoned, result will be discarded");
            self.controller.transition(TransactionState::Idle);
        }
    }
}
