use alloy::json_abi::JsonAbi;
use anyhow::{anyhow, Result};
use std::path::Path;
use tokio::fs;
use tracing::debug;

use crate::error::{DemoError, DemoResult};

/// Token details and balances.
pub const ERC20_READ_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function decimals() view returns (uint8)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address) view returns (uint256)",
];

pub const ERC20_WRITE_ABI: &[&str] = &[
    "function decimals() view returns (uint8)",
    "function balanceOf(address) view returns (uint256)",
    "function transfer(address to, uint256 amount) returns (bool)",
];

/// `from` and `to` are indexed and land in topics 1 and 2; topic 0 is the
/// hash of the event signature.
pub const ERC20_EVENTS_ABI: &[&str] = &[
    "function name() view returns (string)",
    "function symbol() view returns (string)",
    "function totalSupply() view returns (uint256)",
    "function balanceOf(address) view returns (uint256)",
    "event Transfer(address indexed from, address indexed to, uint256 amount)",
];

/// Builds an interface from human-readable function and event signatures.
pub fn parse_interface<'a, I>(signatures: I) -> DemoResult<JsonAbi>
where
    I: IntoIterator<Item = &'a str>,
{
    JsonAbi::parse(signatures)
        .map_err(|e| DemoError::InvalidInput(format!("Failed to parse interface: {}", e)))
}

/// Loads an interface from disk. The file may hold a JSON ABI array or one
/// human-readable signature per line (`#` starts a comment).
pub async fn load_interface<P: AsRef<Path>>(path: P) -> Result<JsonAbi> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| anyhow!("Failed to read ABI file {:?}: {}", path, e))?;

    let trimmed = content.trim_start();
    let abi = if trimmed.starts_with('[') || trimmed.starts_with('{') {
        debug!("Parsing {:?} as JSON ABI", path);
        serde_json::from_str::<JsonAbi>(trimmed)
            .map_err(|e| anyhow!("Failed to parse ABI JSON {:?}: {}", path, e))?
    } else {
        debug!("Parsing {:?} as human-readable ABI", path);
        let signatures = content
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default().trim())
            .map(|line| line.trim_end_matches(','))
            .filter(|line| !line.is_empty());
        parse_interface(signatures)?
    };

    Ok(abi)
}
