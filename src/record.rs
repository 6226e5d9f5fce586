//! Wave records
//!
//! Immutable view of one wave, converted from the contract's
//! `(address, epoch seconds, message)` tuple.

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, WavePortalError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveRecord {
    /// Who waved
    pub address: Address,
    /// Block time of the wave
    pub timestamp: DateTime<Utc>,
    /// Free text, may be empty
    pub message: String,
}

/// What to render for a record's message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveBody<'a> {
    /// Empty message, shown as a plain wave
    Wave,
    Text(&'a str),
}

impl WaveRecord {
    /// Build a record from the on-chain tuple, `seconds` is unix epoch seconds
    pub fn from_chain(address: Address, seconds: U256, message: String) -> Result<Self> {
        let seconds = u64::try_from(seconds).map_err(|_| {
            WavePortalError::invalid_response(format!("wave timestamp {} does not fit in u64", seconds))
        })?;
        let millis = seconds
            .checked_mul(1000)
            .and_then(|ms| i64::try_from(ms).ok())
            .ok_or_else(|| WavePortalError::invalid_response(format!("wave timestamp {} out of range", seconds)))?;
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| WavePortalError::invalid_response(format!("wave timestamp {} out of range", seconds)))?;

        Ok(Self {
            address,
            timestamp,
            message,
        })
    }

    pub fn body(&self) -> WaveBody<'_> {
        if self.message.is_empty() {
            WaveBody::Wave
        } else {
            WaveBody::Text(&self.message)
        }
    }

    /// `MM/DD/YYYY, hh:mm:ss AM` in UTC
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format("%m/%d/%Y, %I:%M:%S %p").to_string()
    }
}
