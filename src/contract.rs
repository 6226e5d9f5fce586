//! WavePortal contract client
//!
//! Typed facade over the three contract operations plus the `NewWave` event.
//! Every call that touches the network goes through the chain guard first.
//! Reads use `eth_call`, the write uses `eth_sendTransaction` from the
//! session account with a fixed gas ceiling.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_sol_types::{SolCall, SolEvent};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use crate::abi::{self, getAllWavesCall, getTotalWavesCall, waveCall, NewWave, RpcLog};
use crate::config::PortalConfig;
use crate::provider::{parse_quantity, WalletProvider};
use crate::record::WaveRecord;
use crate::session::WalletSession;
use crate::{Result, WavePortalError};

/// Receipt fields the client looks at
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` reverted
    #[serde(default)]
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_quantity(&Value::from(status)).map(|s| s == 1).unwrap_or(false),
            // Pre-Byzantium receipts carry no status
            None => true,
        }
    }
}

/// Handle to a submitted `wave` transaction
pub struct PendingWave {
    tx_hash: B256,
    provider: Arc<dyn WalletProvider>,
    poll_interval: Duration,
}

impl PendingWave {
    pub fn tx_hash(&self) -> B256 {
        self.tx_hash
    }

    /// Wait until the transaction is mined
    ///
    /// Polls for the receipt with no timeout. A reverted transaction is a
    /// `TransactionFailed` error.
    pub async fn wait(&self) -> Result<TransactionReceipt> {
        loop {
            let value = self
                .provider
                .request("eth_getTransactionReceipt", json!([self.tx_hash]))
                .await
                .map_err(|e| WavePortalError::transaction_failed(format!("receipt lookup failed: {}", e)))?;

            if !value.is_null() {
                let receipt: TransactionReceipt = serde_json::from_value(value)?;
                if receipt.succeeded() {
                    return Ok(receipt);
                }
                return Err(WavePortalError::transaction_failed(format!(
                    "transaction {} reverted",
                    self.tx_hash
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Live `NewWave` listener, stopped on `unsubscribe` or drop
pub struct WaveSubscription {
    task: JoinHandle<()>,
}

impl WaveSubscription {
    pub fn unsubscribe(self) {
        drop(self);
    }

    pub fn is_active(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for WaveSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct ContractClient {
    session: Arc<WalletSession>,
    address: Address,
    gas_limit: u64,
    poll_interval: Duration,
}

impl ContractClient {
    pub fn new(session: Arc<WalletSession>, config: &PortalConfig) -> Self {
        Self {
            session,
            address: config.contract_address,
            gas_limit: config.gas_limit,
            poll_interval: config.poll_interval,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Read the total number of waves
    pub async fn get_total_waves(&self) -> Result<u64> {
        let data = self.call(getTotalWavesCall {}.abi_encode()).await?;
        let total = getTotalWavesCall::abi_decode_returns(&data, true)?._0;
        let total = u64::try_from(total)
            .map_err(|_| WavePortalError::read(format!("wave count {} does not fit in u64", total)))?;
        log::info!("📮 Retrieved total wave count: {}", total);
        Ok(total)
    }

    /// Read every wave, oldest first
    pub async fn get_all_waves(&self) -> Result<Vec<WaveRecord>> {
        let data = self.call(getAllWavesCall {}.abi_encode()).await?;
        let waves = getAllWavesCall::abi_decode_returns(&data, true)?._0;
        log::debug!("Retrieved {} waves", waves.len());
        waves.into_iter().map(WaveRecord::try_from).collect()
    }

    /// Submit a wave, returns once the wallet hands back a transaction hash
    pub async fn wave(&self, message: &str) -> Result<PendingWave> {
        let provider = self.session.provider()?;
        self.session.guard().ensure_network(provider.as_ref()).await?;
        let signer = self.session.signer()?;

        let calldata = waveCall {
            _message: message.to_string(),
        }
        .abi_encode();

        let tx = json!({
            "from": signer.address(),
            "to": self.address,
            "data": format!("0x{}", hex::encode(calldata)),
            "gas": format!("0x{:x}", self.gas_limit),
        });

        log::debug!("Sending wave from {} ({} bytes of message)", signer.address(), message.len());
        let value = signer
            .provider()
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        let tx_hash: B256 = serde_json::from_value(value)?;

        Ok(PendingWave {
            tx_hash,
            provider: provider.clone(),
            poll_interval: self.poll_interval,
        })
    }

    /// Register a live `NewWave` listener
    ///
    /// Registration pins the chain first, so the starting head belongs to
    /// the required chain. The handler runs once per event, in emission
    /// order, for events mined after registration. Ticks where the wallet
    /// has since moved to another chain are skipped without prompting.
    pub async fn subscribe_new_wave<F>(&self, handler: F) -> Result<WaveSubscription>
    where
        F: Fn(WaveRecord) + Send + Sync + 'static,
    {
        let provider = self.session.provider()?.clone();
        let guard = self.session.guard().clone();
        let address = self.address;
        let poll_interval = self.poll_interval;

        guard.ensure_network(provider.as_ref()).await?;
        let mut next_block = block_number(provider.as_ref()).await? + 1;
        log::debug!("Listening for NewWave from block {}", next_block);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;

                match guard.is_on_required_chain(provider.as_ref()).await {
                    Ok(true) => {}
                    Ok(false) => continue,
                    Err(e) => {
                        log::warn!("NewWave poll: chain check failed: {}", e);
                        continue;
                    }
                }

                match poll_new_waves(provider.as_ref(), address, next_block).await {
                    Ok((records, head)) => {
                        for record in records {
                            handler(record);
                        }
                        next_block = head + 1;
                    }
                    Err(e) => log::warn!("NewWave poll failed: {}", e),
                }
            }
        });

        Ok(WaveSubscription { task })
    }

    async fn call(&self, calldata: Vec<u8>) -> Result<Vec<u8>> {
        let provider = self.session.provider()?;
        self.session.guard().ensure_network(provider.as_ref()).await?;

        let mut tx = json!({
            "to": self.address,
            "data": format!("0x{}", hex::encode(calldata)),
        });
        if let Some(account) = self.session.account() {
            tx["from"] = json!(account);
        }

        let value = provider
            .request("eth_call", json!([tx, "latest"]))
            .await
            .map_err(|e| WavePortalError::read(format!("eth_call failed: {}", e)))?;
        decode_hex_data(&value)
    }
}

async fn block_number(provider: &dyn WalletProvider) -> Result<u64> {
    let value = provider
        .request("eth_blockNumber", json!([]))
        .await
        .map_err(|e| WavePortalError::read(format!("eth_blockNumber failed: {}", e)))?;
    parse_quantity(&value)
}

/// Fetch `NewWave` logs from `from_block` up to the current head
///
/// Returns the decoded records and the head that was covered.
async fn poll_new_waves(
    provider: &dyn WalletProvider,
    address: Address,
    from_block: u64,
) -> Result<(Vec<WaveRecord>, u64)> {
    let head = block_number(provider).await?;
    if head < from_block {
        return Ok((Vec::new(), from_block - 1));
    }

    let filter = json!({
        "address": address,
        "topics": [NewWave::SIGNATURE_HASH],
        "fromBlock": format!("0x{:x}", from_block),
        "toBlock": format!("0x{:x}", head),
    });
    let value = provider
        .request("eth_getLogs", json!([filter]))
        .await
        .map_err(|e| WavePortalError::read(format!("eth_getLogs failed: {}", e)))?;
    let logs: Vec<RpcLog> = serde_json::from_value(value)?;

    let mut records = Vec::with_capacity(logs.len());
    for log in logs.iter().filter(|log| !log.removed) {
        match abi::decode_new_wave(log).and_then(WaveRecord::try_from) {
            Ok(record) => {
                log::info!("👋 NewWave from {}", record.address);
                records.push(record);
            }
            Err(e) => log::warn!("Skipping undecodable NewWave log: {}", e),
        }
    }

    Ok((records, head))
}

fn decode_hex_data(value: &Value) -> Result<Vec<u8>> {
    let text = value
        .as_str()
        .ok_or_else(|| WavePortalError::invalid_response(format!("expected hex data, got {}", value)))?;
    hex::decode(text.trim_start_matches("0x"))
        .map_err(|e| WavePortalError::invalid_response(format!("bad hex data: {}", e)))
}
