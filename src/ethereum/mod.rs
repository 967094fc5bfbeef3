pub mod abi;
pub mod contract;
#[cfg(test)]
pub mod mock;
pub mod provider;
pub mod units;
pub mod utils;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;

/// A mined transaction: what was signed plus what its receipt reports.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionInfo {
    pub hash: B256,
    pub nonce: Option<u64>,
    pub chain_id: Option<u64>,
    pub from: Address,
    pub to: Option<Address>,
    #[serde(serialize_with = "units::decimal")]
    pub value: U256,
    pub input: Bytes,
    pub gas_used: u64,
    pub effective_gas_price: u128,
    pub block_number: Option<u64>,
    pub status: bool,
}

impl TransactionInfo {
    /// Total fee paid in wei.
    pub fn fee(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventInfo {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u64,
    pub removed: bool,
    pub event: String,
    pub args: serde_json::Value,
}
