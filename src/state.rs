//! Observable session values: total wave count and the message draft

use std::sync::Mutex;

use tokio::sync::watch;

use crate::contract::ContractClient;

/// `-1` means the count has not been loaded yet
pub const TOTAL_UNKNOWN: i64 = -1;

/// Total wave count as last read from the contract
pub struct TotalWaves {
    value: watch::Sender<i64>,
}

impl Default for TotalWaves {
    fn default() -> Self {
        Self::new()
    }
}

impl TotalWaves {
    pub fn new() -> Self {
        let (value, _) = watch::channel(TOTAL_UNKNOWN);
        Self { value }
    }

    /// Raw value with the `-1` sentinel
    pub fn raw(&self) -> i64 {
        *self.value.borrow()
    }

    pub fn get(&self) -> Option<u64> {
        u64::try_from(self.raw()).ok()
    }

    pub fn set(&self, total: u64) {
        let value = i64::try_from(total).unwrap_or_else(|_| {
            log::warn!("Wave count {} out of range, clamping to {}", total, i64::MAX);
            i64::MAX
        });
        self.value.send_replace(value);
    }

    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.value.subscribe()
    }

    /// Re-read the count, keeping the old value if the read fails
    pub async fn refresh(&self, contract: &ContractClient) -> Option<u64> {
        match contract.get_total_waves().await {
            Ok(total) => {
                self.set(total);
                Some(total)
            }
            Err(e) => {
                log::warn!("Could not read total waves: {}", e);
                None
            }
        }
    }
}

/// Text the user is composing
#[derive(Default)]
pub struct MessageDraft {
    text: Mutex<String>,
}

impl MessageDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> String {
        self.text.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn set(&self, text: impl Into<String>) {
        if let Ok(mut current) = self.text.lock() {
            *current = text.into();
        }
    }

    pub fn clear(&self) {
        self.set(String::new());
    }
}
