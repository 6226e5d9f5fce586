//! Common test utilities for wave portal integration tests
//!
//! This module provides shared test infrastructure including:
//! - A scripted in-memory EIP-1193 wallet that also emulates the WavePortal
//!   contract and mines transactions instantly
//! - A notifier that records everything it is told
//! - Logging setup and polling helpers

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use alloy_primitives::{keccak256, Address, LogData, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use wave_portal::abi::{getAllWavesCall, getTotalWavesCall, waveCall, NewWave, Wave};
use wave_portal::provider::{format_chain_id, ProviderError, UNSUPPORTED_METHOD};
use wave_portal::{Notifier, PortalConfig, ProviderEvent, WalletProvider};

/// Chain the default config requires
pub const REQUIRED_CHAIN: u64 = 4;

/// Methods that open a wallet prompt
const PROMPTING_METHODS: &[&str] = &[
    "eth_requestAccounts",
    "wallet_switchEthereumChain",
    "wallet_addEthereumChain",
    "eth_sendTransaction",
];

/// Initialize logging (only once, subsequent calls are no-ops)
pub fn init_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Default config with a fast poll interval
pub fn test_config() -> PortalConfig {
    PortalConfig {
        poll_interval: Duration::from_millis(10),
        ..PortalConfig::default()
    }
}

pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

/// Poll `condition` until it holds, panics after two seconds
pub async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Everything the scripted wallet knows
pub struct MockState {
    /// Chain the wallet is on
    pub chain_id: u64,
    /// Chains the wallet can switch to without registering them
    pub known_chains: HashSet<u64>,
    /// Accounts returned by `eth_accounts`
    pub authorized: Vec<Address>,
    /// Accounts granted when the user approves `eth_requestAccounts`
    pub grantable: Vec<Address>,
    pub reject_connect: bool,
    pub reject_switch: bool,
    pub fail_add_chain: Option<ProviderError>,
    pub fail_switch: Option<ProviderError>,
    pub reject_signing: bool,
    /// Next transaction reverts
    pub revert_next: bool,
    /// Receipts are withheld while set
    pub hold_receipts: bool,
    /// Contract storage
    pub waves: Vec<Wave>,
    /// Head of the required chain
    pub block_number: u64,
    /// Head reported while the wallet sits on any other chain
    pub foreign_block_number: u64,
    /// `(block, log)` pairs for `eth_getLogs`
    pub logs: Vec<(u64, LogData)>,
    /// Mined transactions, `true` for success
    pub receipts: HashMap<B256, bool>,
    /// Method of every request, in order
    pub requests: Vec<String>,
    pub add_chain_params: Vec<Value>,
    pub sent_transactions: Vec<Value>,
    /// Unix seconds used for the next mined wave
    pub clock: u64,
    /// Methods whose requests never resolve
    pub stalled: HashSet<String>,
    /// Stall `eth_call` once a wave has been mined
    pub stall_reads_after_wave: bool,
    nonce: u64,
}

pub struct MockWallet {
    state: Mutex<MockState>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    /// Wallet on `chain_id`, nothing authorized yet, alice grantable
    pub fn new(chain_id: u64) -> Arc<Self> {
        let (events, _) = broadcast::channel(16);
        Arc::new(Self {
            state: Mutex::new(MockState {
                chain_id,
                known_chains: [1, chain_id].into_iter().collect(),
                authorized: Vec::new(),
                grantable: vec![alice()],
                reject_connect: false,
                reject_switch: false,
                fail_add_chain: None,
                fail_switch: None,
                reject_signing: false,
                revert_next: false,
                hold_receipts: false,
                waves: Vec::new(),
                block_number: 100,
                foreign_block_number: 1_000_000,
                logs: Vec::new(),
                receipts: HashMap::new(),
                requests: Vec::new(),
                add_chain_params: Vec::new(),
                sent_transactions: Vec::new(),
                clock: 1_650_000_000,
                stalled: HashSet::new(),
                stall_reads_after_wave: false,
                nonce: 0,
            }),
            events,
        })
    }

    /// Wallet on the required chain with `account` already authorized
    pub fn connected(account: Address) -> Arc<Self> {
        let wallet = Self::new(REQUIRED_CHAIN);
        wallet.state().authorized = vec![account];
        wallet
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Store a wave as if it had been mined earlier
    pub fn seed_wave(&self, waver: Address, message: &str, timestamp: u64) {
        self.state().waves.push(Wave {
            waver,
            message: message.to_string(),
            timestamp: U256::from(timestamp),
        });
    }

    /// Push a wallet notification
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn requests(&self) -> Vec<String> {
        self.state().requests.clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.state().requests.iter().filter(|m| m.as_str() == method).count()
    }

    pub fn prompt_count(&self) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|m| PROMPTING_METHODS.contains(&m.as_str()))
            .count()
    }

    fn handle(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        let mut state = self.state();
        state.requests.push(method.to_string());

        match method {
            "eth_chainId" => Ok(json!(format_chain_id(state.chain_id))),
            "eth_accounts" => Ok(json!(state.authorized)),
            "eth_requestAccounts" => {
                if state.reject_connect {
                    return Err(ProviderError::user_rejected());
                }
                state.authorized = state.grantable.clone();
                Ok(json!(state.authorized))
            }
            "wallet_switchEthereumChain" => {
                if state.reject_switch {
                    return Err(ProviderError::user_rejected());
                }
                if let Some(err) = state.fail_switch.clone() {
                    return Err(err);
                }
                let chain_id = chain_param(params);
                if !state.known_chains.contains(&chain_id) {
                    return Err(ProviderError::unrecognized_chain(chain_id));
                }
                state.chain_id = chain_id;
                Ok(Value::Null)
            }
            "wallet_addEthereumChain" => {
                state.add_chain_params.push(params[0].clone());
                if let Some(err) = state.fail_add_chain.clone() {
                    return Err(err);
                }
                let chain_id = chain_param(params);
                state.known_chains.insert(chain_id);
                Ok(Value::Null)
            }
            "eth_call" => {
                let data = hex_param(&params[0]["data"]);
                let result = if data.starts_with(&getTotalWavesCall::SELECTOR) {
                    getTotalWavesCall::abi_encode_returns(&(U256::from(state.waves.len()),))
                } else if data.starts_with(&getAllWavesCall::SELECTOR) {
                    getAllWavesCall::abi_encode_returns(&(state.waves.clone(),))
                } else {
                    return Err(ProviderError::new(-32000, "execution reverted"));
                };
                Ok(json!(format!("0x{}", hex::encode(result))))
            }
            "eth_sendTransaction" => {
                if state.reject_signing {
                    return Err(ProviderError::user_rejected());
                }
                let tx = params[0].clone();
                let from: Address = serde_json::from_value(tx["from"].clone()).unwrap();
                let call = waveCall::abi_decode(&hex_param(&tx["data"]), true).unwrap();
                state.sent_transactions.push(tx);

                state.nonce += 1;
                let tx_hash = keccak256(state.nonce.to_be_bytes());

                if state.revert_next {
                    state.revert_next = false;
                    state.block_number += 1;
                    state.receipts.insert(tx_hash, false);
                    return Ok(json!(tx_hash));
                }

                state.clock += 1;
                state.block_number += 1;
                let timestamp = U256::from(state.clock);
                state.waves.push(Wave {
                    waver: from,
                    message: call._message.clone(),
                    timestamp,
                });
                let log = NewWave {
                    from,
                    timestamp,
                    message: call._message,
                }
                .encode_log_data();
                let block = state.block_number;
                state.logs.push((block, log));
                state.receipts.insert(tx_hash, true);
                if state.stall_reads_after_wave {
                    state.stalled.insert("eth_call".to_string());
                }
                Ok(json!(tx_hash))
            }
            "eth_getTransactionReceipt" => {
                if state.hold_receipts {
                    return Ok(Value::Null);
                }
                let tx_hash: B256 = serde_json::from_value(params[0].clone()).unwrap();
                Ok(match state.receipts.get(&tx_hash) {
                    Some(&ok) => json!({
                        "transactionHash": tx_hash,
                        "blockNumber": format!("0x{:x}", state.block_number),
                        "status": if ok { "0x1" } else { "0x0" },
                    }),
                    None => Value::Null,
                })
            }
            "eth_blockNumber" => {
                let head = if state.chain_id == REQUIRED_CHAIN {
                    state.block_number
                } else {
                    state.foreign_block_number
                };
                Ok(json!(format!("0x{:x}", head)))
            }
            "eth_getLogs" if state.chain_id != REQUIRED_CHAIN => Ok(json!([])),
            "eth_getLogs" => {
                let from = quantity_param(&params[0]["fromBlock"]);
                let to = quantity_param(&params[0]["toBlock"]);
                let logs: Vec<Value> = state
                    .logs
                    .iter()
                    .enumerate()
                    .filter(|(_, (block, _))| *block >= from && *block <= to)
                    .map(|(index, (block, log))| {
                        json!({
                            "topics": log.topics(),
                            "data": log.data,
                            "blockNumber": format!("0x{:x}", block),
                            "logIndex": format!("0x{:x}", index),
                            "removed": false,
                        })
                    })
                    .collect();
                Ok(json!(logs))
            }
            other => Err(ProviderError::new(
                UNSUPPORTED_METHOD,
                format!("mock wallet does not support {}", other),
            )),
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let stalled = self.state().stalled.contains(method);
        if stalled {
            self.state().requests.push(method.to_string());
            return std::future::pending::<Result<Value, ProviderError>>().await;
        }

        let result = self.handle(method, &params);
        tokio::task::yield_now().await;
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

fn hex_param(value: &Value) -> Vec<u8> {
    hex::decode(value.as_str().unwrap().trim_start_matches("0x")).unwrap()
}

fn quantity_param(value: &Value) -> u64 {
    u64::from_str_radix(value.as_str().unwrap().trim_start_matches("0x"), 16).unwrap()
}

fn chain_param(params: &Value) -> u64 {
    quantity_param(&params[0]["chainId"])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Note {
    Success(String),
    Error(String),
    Warn(String),
}

/// Notifier that keeps everything it is told
#[derive(Default)]
pub struct RecordingNotifier {
    notes: Mutex<Vec<Note>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Error(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Success(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Warn(text) => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, text: &str) {
        self.notes.lock().unwrap().push(Note::Success(text.to_string()));
    }

    fn error(&self, text: &str) {
        self.notes.lock().unwrap().push(Note::Error(text.to_string()));
    }

    fn warn(&self, text: &str) {
        self.notes.lock().unwrap().push(Note::Warn(text.to_string()));
    }
}
