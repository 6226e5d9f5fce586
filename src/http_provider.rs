//! Node-backed wallet provider
//!
//! Speaks JSON-RPC over HTTP to a development node that holds unlocked
//! accounts (anvil, hardhat, geth --dev). The node stands in for the wallet:
//! it cannot switch or register chains, so the wallet_* methods are answered
//! locally.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::broadcast;

use crate::provider::{
    parse_quantity, ProviderError, ProviderEvent, WalletProvider, INTERNAL_ERROR, UNSUPPORTED_METHOD,
};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ProviderError>,
}

pub struct HttpWalletProvider {
    url: String,
    /// reqwest::Client is internally Arc-based
    http_client: reqwest::Client,
    next_id: AtomicU64,
    /// A node never pushes notifications, kept so listeners can register
    events: broadcast::Sender<ProviderEvent>,
}

impl HttpWalletProvider {
    pub fn new(url: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            url: url.into(),
            http_client: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Raw JSON-RPC call to the node
    pub async fn rpc(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        log::debug!("→ {} #{}", method, request.id);

        let response = self
            .http_client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::new(INTERNAL_ERROR, format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::new(
                INTERNAL_ERROR,
                format!("HTTP {} from {}", status, self.url),
            ));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::new(INTERNAL_ERROR, format!("Invalid JSON-RPC response: {}", e)))?;

        match (body.error, body.result) {
            (Some(error), _) => Err(error),
            (None, result) => Ok(result.unwrap_or(Value::Null)),
        }
    }

    async fn switch_chain(&self, params: &Value) -> Result<Value, ProviderError> {
        let requested = params
            .get(0)
            .and_then(|p| p.get("chainId"))
            .ok_or_else(|| ProviderError::new(-32602, "missing chainId"))?;
        let requested = parse_quantity(requested).map_err(|e| ProviderError::new(-32602, e.to_string()))?;

        let current = self.rpc("eth_chainId", json!([])).await?;
        let current = parse_quantity(&current).map_err(|e| ProviderError::new(INTERNAL_ERROR, e.to_string()))?;

        if current == requested {
            Ok(Value::Null)
        } else {
            log::warn!("Node serves chain {}, cannot switch to {}", current, requested);
            Err(ProviderError::unrecognized_chain(requested))
        }
    }
}

#[async_trait]
impl WalletProvider for HttpWalletProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match method {
            // Unlocked node accounts are always authorized
            "eth_requestAccounts" => self.rpc("eth_accounts", json!([])).await,
            "wallet_switchEthereumChain" => self.switch_chain(&params).await,
            "wallet_addEthereumChain" => Err(ProviderError::new(
                UNSUPPORTED_METHOD,
                "a node-backed wallet cannot register chains",
            )),
            _ => self.rpc(method, params).await,
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}
