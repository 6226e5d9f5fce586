//! Portal configuration
//!
//! Network requirement, contract address and gas ceiling are fixed when the
//! crate is compiled. Defaults target the deployed WavePortal on Rinkeby and
//! can be overridden through build-time environment variables.

use std::time::Duration;

use alloy_primitives::{address, Address};

/// Rinkeby
pub const DEFAULT_CHAIN_ID: u64 = 4;
pub const DEFAULT_CHAIN_NAME: &str = "Rinkeby";
pub const DEFAULT_RPC_ENDPOINT: &str = "https://rinkeby.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161";
pub const DEFAULT_CONTRACT_ADDRESS: Address = address!("26EcA6DCe67C344D99D96359819cD942b3543fb8");
/// Upper bound on gas for a single `wave` call
pub const DEFAULT_GAS_LIMIT: u64 = 300_000;
/// Receipt and event polling cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// The single chain every contract call must run on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkRequirement {
    pub chain_id: u64,
    pub chain_name: String,
    pub rpc_endpoint: String,
}

impl Default for NetworkRequirement {
    fn default() -> Self {
        Self {
            chain_id: DEFAULT_CHAIN_ID,
            chain_name: DEFAULT_CHAIN_NAME.to_string(),
            rpc_endpoint: DEFAULT_RPC_ENDPOINT.to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    /// Required chain
    pub network: NetworkRequirement,
    /// WavePortal contract
    pub contract_address: Address,
    /// Gas limit sent with every `wave` transaction
    pub gas_limit: u64,
    /// Interval between receipt polls and live event polls
    pub poll_interval: Duration,
}

impl PortalConfig {
    /// Load configuration baked in at compile time
    ///
    /// Build-time variables:
    /// - `WAVE_PORTAL_CHAIN_ID`: decimal chain id
    /// - `WAVE_PORTAL_RPC_URL`: RPC endpoint offered when registering the chain
    /// - `WAVE_PORTAL_CONTRACT`: contract address
    /// - `WAVE_PORTAL_GAS_LIMIT`: gas ceiling for writes
    ///
    /// # Examples
    ///
    /// ```bash
    /// # Point a build at a local dev chain
    /// WAVE_PORTAL_CHAIN_ID=31337 WAVE_PORTAL_RPC_URL=http://localhost:8545 cargo build
    /// ```
    pub fn from_build_env() -> Self {
        Self::from_overrides(
            option_env!("WAVE_PORTAL_CHAIN_ID"),
            option_env!("WAVE_PORTAL_RPC_URL"),
            option_env!("WAVE_PORTAL_CONTRACT"),
            option_env!("WAVE_PORTAL_GAS_LIMIT"),
        )
    }

    fn from_overrides(
        chain_id: Option<&str>,
        rpc_url: Option<&str>,
        contract: Option<&str>,
        gas_limit: Option<&str>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(raw) = chain_id {
            match raw.trim().parse::<u64>() {
                Ok(id) => {
                    log::info!("🔧 Chain id override: {}", id);
                    config.network.chain_id = id;
                    config.network.chain_name = format!("Chain {}", id);
                }
                Err(e) => log::warn!("⚠️  Ignoring chain id override '{}': {}", raw, e),
            }
        }

        if let Some(url) = rpc_url {
            log::info!("📡 RPC endpoint override: {}", url);
            config.network.rpc_endpoint = url.to_string();
        }

        if let Some(raw) = contract {
            match raw.trim().parse::<Address>() {
                Ok(addr) => {
                    log::info!("📜 Contract override: {}", addr);
                    config.contract_address = addr;
                }
                Err(e) => log::warn!("⚠️  Ignoring contract override '{}': {}", raw, e),
            }
        }

        if let Some(raw) = gas_limit {
            match raw.trim().parse::<u64>() {
                Ok(limit) if limit > 0 => config.gas_limit = limit,
                _ => log::warn!("⚠️  Ignoring gas limit override '{}'", raw),
            }
        }

        config
    }
}

impl Default for PortalConfig {
    /// Deployed WavePortal on Rinkeby
    fn default() -> Self {
        Self {
            network: NetworkRequirement::default(),
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
