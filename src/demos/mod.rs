pub mod balance;
pub mod events;
pub mod read_contract;
pub mod transfer;
pub mod write_contract;

use alloy::primitives::Address;
use std::path::PathBuf;

/// One demonstration and its inputs.
#[derive(Debug, Clone)]
pub enum Demo {
    Balance {
        address: Address,
    },
    Transfer {
        receiver: Address,
        /// In ether.
        amount: String,
    },
    ReadContract {
        token: Address,
        holder: Address,
        abi: Option<PathBuf>,
    },
    WriteContract {
        token: Address,
        receiver: Address,
        /// In whole tokens.
        amount: String,
        abi: Option<PathBuf>,
    },
    Events {
        token: Address,
        event: String,
        blocks: u64,
        abi: Option<PathBuf>,
    },
}

impl Demo {
    pub fn name(&self) -> &'static str {
        match self {
            Demo::Balance { .. } => "balance",
            Demo::Transfer { .. } => "transfer",
            Demo::ReadContract { .. } => "read",
            Demo::WriteContract { .. } => "write",
            Demo::Events { .. } => "events",
        }
    }

    /// Whether the demo broadcasts transactions and needs a private key.
    pub fn signs(&self) -> bool {
        matches!(self, Demo::Transfer { .. } | Demo::WriteContract { .. })
    }
}
