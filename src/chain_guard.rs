//! Chain guard
//!
//! Keeps the wallet on the one chain the contract lives on. Users can flip
//! networks in their wallet at any time, so every contract call runs
//! [`ChainGuard::ensure_network`] first.

use serde::Serialize;
use serde_json::json;

use crate::config::NetworkRequirement;
use crate::provider::{
    format_chain_id, parse_quantity, ProviderError, WalletProvider, UNRECOGNIZED_CHAIN,
    USER_REJECTED_REQUEST,
};
use crate::{Result, WavePortalError};

/// `wallet_addEthereumChain` parameter (EIP-3085)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AddChainParameter {
    chain_id: String,
    chain_name: String,
    rpc_urls: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ChainGuard {
    requirement: NetworkRequirement,
}

impl ChainGuard {
    pub fn new(requirement: NetworkRequirement) -> Self {
        Self { requirement }
    }

    pub fn requirement(&self) -> &NetworkRequirement {
        &self.requirement
    }

    /// Chain the wallet is currently on (`eth_chainId`, never prompts)
    pub async fn active_chain(&self, provider: &dyn WalletProvider) -> Result<u64> {
        let value = provider
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| WavePortalError::network(format!("eth_chainId failed: {}", e)))?;
        parse_quantity(&value)
    }

    /// Whether the wallet is already on the required chain, without prompting
    pub async fn is_on_required_chain(&self, provider: &dyn WalletProvider) -> Result<bool> {
        Ok(self.active_chain(provider).await? == self.requirement.chain_id)
    }

    /// Make sure the wallet is on the required chain
    ///
    /// No-op when already there. Otherwise asks the wallet to switch; if the
    /// wallet does not know the chain (code 4902) it registers the chain and
    /// retries the switch once. May wait on wallet prompts indefinitely.
    pub async fn ensure_network(&self, provider: &dyn WalletProvider) -> Result<()> {
        let active = self.active_chain(provider).await?;
        if active == self.requirement.chain_id {
            log::debug!("Already on chain {}", active);
            return Ok(());
        }

        log::info!(
            "🔀 Wallet on chain {}, switching to {} ({})",
            active,
            self.requirement.chain_id,
            self.requirement.chain_name
        );

        match self.switch_chain(provider).await {
            Ok(()) => {}
            Err(e) if e.code == UNRECOGNIZED_CHAIN => {
                log::info!("   Chain {} unknown to wallet, registering it", self.requirement.chain_id);
                self.add_chain(provider).await.map_err(|e| map_chain_error("add chain", e))?;
                self.switch_chain(provider)
                    .await
                    .map_err(|e| map_chain_error("switch chain after registering it", e))?;
            }
            Err(e) => return Err(map_chain_error("switch chain", e)),
        }

        log::info!("   ✅ On chain {}", self.requirement.chain_id);
        Ok(())
    }

    async fn switch_chain(&self, provider: &dyn WalletProvider) -> std::result::Result<(), ProviderError> {
        provider
            .request(
                "wallet_switchEthereumChain",
                json!([{ "chainId": format_chain_id(self.requirement.chain_id) }]),
            )
            .await
            .map(|_| ())
    }

    async fn add_chain(&self, provider: &dyn WalletProvider) -> std::result::Result<(), ProviderError> {
        let param = AddChainParameter {
            chain_id: format_chain_id(self.requirement.chain_id),
            chain_name: self.requirement.chain_name.clone(),
            rpc_urls: vec![self.requirement.rpc_endpoint.clone()],
        };
        provider
            .request("wallet_addEthereumChain", json!([param]))
            .await
            .map(|_| ())
    }
}

fn map_chain_error(step: &str, err: ProviderError) -> WavePortalError {
    if err.code == USER_REJECTED_REQUEST {
        WavePortalError::UserRejected
    } else {
        log::error!("   ❌ Failed to {}: {}", step, err);
        WavePortalError::network(format!("failed to {}: {}", step, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_chain_parameter_shape() {
        let param = AddChainParameter {
            chain_id: format_chain_id(4),
            chain_name: "Rinkeby".to_string(),
            rpc_urls: vec!["https://rinkeby.example".to_string()],
        };
        assert_eq!(
            serde_json::to_value(param).unwrap(),
            json!({"chainId": "0x4", "chainName": "Rinkeby", "rpcUrls": ["https://rinkeby.example"]})
        );
    }

    #[test]
    fn test_rejection_is_not_a_network_error() {
        assert_eq!(
            map_chain_error("switch chain", ProviderError::user_rejected()),
            WavePortalError::UserRejected
        );
        assert!(matches!(
            map_chain_error("switch chain", ProviderError::new(-32002, "pending")),
            WavePortalError::Network(_)
        ));
    }
}
