//! WavePortal contract ABI
//!
//! Only the part of the contract surface this client consumes.

use alloy_primitives::{Bytes, B256};
use alloy_sol_types::{sol, SolEvent};
use serde::Deserialize;

use crate::record::WaveRecord;
use crate::Result;

sol! {
    /// One stored wave
    #[derive(Debug, PartialEq, Eq)]
    struct Wave {
        address waver;
        string message;
        uint256 timestamp;
    }

    function getTotalWaves() external view returns (uint256);

    function getAllWaves() external view returns (Wave[] memory);

    function wave(string memory _message) external;

    #[derive(Debug, PartialEq, Eq)]
    event NewWave(address indexed from, uint256 timestamp, string message);
}

/// Log object as returned by `eth_getLogs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

impl TryFrom<Wave> for WaveRecord {
    type Error = crate::WavePortalError;

    fn try_from(wave: Wave) -> Result<Self> {
        WaveRecord::from_chain(wave.waver, wave.timestamp, wave.message)
    }
}

impl TryFrom<NewWave> for WaveRecord {
    type Error = crate::WavePortalError;

    fn try_from(event: NewWave) -> Result<Self> {
        WaveRecord::from_chain(event.from, event.timestamp, event.message)
    }
}

/// Decode a `NewWave` log
pub fn decode_new_wave(log: &RpcLog) -> Result<NewWave> {
    Ok(NewWave::decode_raw_log(log.topics.iter().copied(), &log.data, true)?)
}
