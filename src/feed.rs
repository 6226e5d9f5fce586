//! Wave feed
//!
//! Merges the bulk `getAllWaves` snapshot with live `NewWave` events. Stored
//! order is arrival order; newest-first is applied on read. There is no
//! unique key per wave, so a live event that races a full reload can show up
//! twice until the next reload.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::contract::ContractClient;
use crate::record::WaveRecord;

/// Identifies one full reload, later tickets supersede earlier ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReloadTicket(u64);

pub struct WaveFeed {
    records: watch::Sender<Vec<WaveRecord>>,
    latest_ticket: AtomicU64,
}

impl Default for WaveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveFeed {
    pub fn new() -> Self {
        let (records, _) = watch::channel(Vec::new());
        Self {
            records,
            latest_ticket: AtomicU64::new(0),
        }
    }

    /// Start a full reload
    pub fn begin_reload(&self) -> ReloadTicket {
        ReloadTicket(self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Replace the feed with a completed reload
    ///
    /// Returns `false` (and leaves the feed alone) when a newer reload has
    /// been started since `ticket` was issued.
    pub fn complete_reload(&self, ticket: ReloadTicket, records: Vec<WaveRecord>) -> bool {
        if ticket.0 != self.latest_ticket.load(Ordering::SeqCst) {
            log::debug!("Discarding stale wave reload {:?}", ticket);
            return false;
        }
        log::debug!("Feed reloaded with {} waves", records.len());
        self.records.send_replace(records);
        true
    }

    /// Full reload from `getAllWaves`, a failed read keeps the current feed
    pub async fn reload(&self, contract: &ContractClient) -> bool {
        let ticket = self.begin_reload();
        match contract.get_all_waves().await {
            Ok(records) => self.complete_reload(ticket, records),
            Err(e) => {
                log::warn!("Could not read waves: {}", e);
                false
            }
        }
    }

    /// Replace the contents outright
    pub fn replace(&self, records: Vec<WaveRecord>) {
        let ticket = self.begin_reload();
        self.complete_reload(ticket, records);
    }

    /// Append one live event
    pub fn push(&self, record: WaveRecord) {
        self.records.send_modify(|records| records.push(record));
    }

    /// Chronological copy of the feed
    pub fn snapshot(&self) -> Vec<WaveRecord> {
        self.records.borrow().clone()
    }

    /// Presentation order
    pub fn newest_first(&self) -> Vec<WaveRecord> {
        self.records.borrow().iter().rev().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    /// Observe feed changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<WaveRecord>> {
        self.records.subscribe()
    }
}
