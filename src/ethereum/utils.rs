use alloy::primitives::{Address, B256};
use std::str::FromStr;

use crate::error::{DemoError, DemoResult};

/// Validates and normalizes an Ethereum address
pub fn validate_address(address: &str) -> DemoResult<Address> {
    let address = address.trim();

    if address.is_empty() {
        return Err(DemoError::InvalidInput("Address cannot be empty".to_string()));
    }

    if !address.starts_with("0x") && !address.starts_with("0X") {
        return Err(DemoError::InvalidInput(format!(
            "Invalid address format: '{}'. Ethereum addresses must start with '0x'",
            address
        )));
    }

    if address.len() != 42 {
        return Err(DemoError::InvalidInput(format!(
            "Invalid address length: '{}'. Ethereum addresses must be exactly 42 characters (0x + 40 hex characters)",
            address
        )));
    }

    if !address[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DemoError::InvalidInput(format!(
            "Invalid address format: '{}'. Contains non-hexadecimal characters",
            address
        )));
    }

    Address::from_str(address)
        .map_err(|e| DemoError::InvalidInput(format!("Invalid Ethereum address: '{}'. Error: {}", address, e)))
}

/// Validates a Solidity identifier used to look up functions and events
pub fn validate_identifier(name: &str) -> DemoResult<()> {
    let Some(first) = name.chars().next() else {
        return Err(DemoError::InvalidInput("Name cannot be empty".to_string()));
    };

    if !first.is_ascii_alphabetic() && first != '_' {
        return Err(DemoError::InvalidInput(format!(
            "Invalid name: '{}'. Names must start with a letter or underscore",
            name
        )));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DemoError::InvalidInput(format!(
            "Invalid name: '{}'. Names can only contain letters, numbers, and underscores",
            name
        )));
    }

    Ok(())
}

/// Inclusive block range ending at `latest` and spanning `span` blocks.
pub fn trailing_block_range(latest: u64, span: u64) -> (u64, u64) {
    (latest.saturating_sub(span.saturating_sub(1)), latest)
}

pub fn explorer_tx_url(explorer: &str, hash: &B256) -> String {
    format!("{}/tx/0x{:x}", explorer.trim_end_matches('/'), hash)
}
