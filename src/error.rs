use alloy::transports::{RpcError, TransportError};
use std::fmt::Display;
use thiserror::Error;

pub type DemoResult<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    /// Missing or malformed configuration, raised before any network call.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The endpoint could not be reached or refused the request.
    #[error("{0}")]
    Connectivity(String),

    /// The node answered but the request made no sense to it: reverts,
    /// insufficient funds, interface mismatches.
    #[error("{0}")]
    Semantic(String),

    #[error("transaction 0x{hash} was not confirmed within {secs}s")]
    ConfirmationTimeout { hash: String, secs: u64 },

    #[error("unit conversion failed: {0}")]
    Conversion(String),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl DemoError {
    pub fn missing_env(var: &str) -> Self {
        Self::Config(format!("environment variable {} is not set", var))
    }

    /// Classifies an alloy transport error. The node answering with an
    /// error object is semantic; failing to reach it is connectivity.
    pub fn from_transport(error: TransportError) -> Self {
        let raw = error.to_string();
        match &error {
            RpcError::ErrorResp(_) => Self::Semantic(interpret_rpc_error(&raw.to_lowercase(), &raw)),
            RpcError::Transport(_) => {
                Self::Connectivity(interpret_rpc_error(&raw.to_lowercase(), &raw))
            }
            _ => Self::from_rpc(raw),
        }
    }

    /// Classifies a node error by its message when no structured error is
    /// available.
    pub fn from_rpc(error: impl Display) -> Self {
        let raw = error.to_string();
        let lower = raw.to_lowercase();
        let friendly = interpret_rpc_error(&lower, &raw);

        if !is_semantic(&lower) && is_connectivity(&lower) {
            Self::Connectivity(friendly)
        } else {
            Self::Semantic(friendly)
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity(_))
    }
}

/// Markers of a node that answered and rejected the request. Checked first:
/// revert data and reasons can contain anything.
fn is_semantic(error: &str) -> bool {
    [
        "execution reverted",
        "insufficient funds",
        "nonce too low",
        "gas required exceeds allowance",
        "replacement transaction underpriced",
        "invalid opcode",
    ]
    .iter()
    .any(|needle| error.contains(needle))
}

fn is_connectivity(error: &str) -> bool {
    [
        "connection refused",
        "connection reset",
        "network unreachable",
        "error sending request",
        "dns error",
        "operation timed out",
        "request timed out",
        "http error 429",
        "http error 502",
        "http error 503",
        "http error 504",
        "status code 429",
        "status code 503",
        "too many requests",
        "method not found",
    ]
    .iter()
    .any(|needle| error.contains(needle))
}

/// Turns common node error strings into something an operator can act on.
fn interpret_rpc_error(error: &str, raw: &str) -> String {
    if error.contains("execution reverted") {
        format!(
            "Transaction failed: The contract function reverted execution. \
             This usually means the function's requirements were not met. ({})",
            raw
        )
    } else if error.contains("insufficient funds") {
        "Transaction failed: Insufficient funds to cover value and gas costs.".to_string()
    } else if error.contains("gas required exceeds allowance") {
        "Transaction failed: Gas limit too low for this transaction.".to_string()
    } else if error.contains("nonce too low") {
        "Transaction failed: Nonce too low. Another transaction was already mined with this nonce."
            .to_string()
    } else if error.contains("replacement transaction underpriced") {
        "Transaction failed: Gas price too low to replace pending transaction.".to_string()
    } else if error.contains("connection refused") || error.contains("network unreachable") {
        "Network error: Cannot connect to RPC endpoint. Check your internet connection and RPC URL configuration.".to_string()
    } else if error.contains("operation timed out") || error.contains("request timed out") {
        "Network error: Request timed out. The RPC endpoint may be overloaded or unreachable."
            .to_string()
    } else if error.contains("http error 429")
        || error.contains("status code 429")
        || error.contains("too many requests")
    {
        "Rate limit error: Too many requests to the RPC endpoint.".to_string()
    } else if error.contains("method not found") {
        "RPC error: The requested method is not supported by this RPC endpoint.".to_string()
    } else {
        format!("RPC error: {}", raw)
    }
}
