use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::DemoResult;
use crate::ethereum::{provider::Chain, units::Amount};

#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub address: Address,
    pub balance: Amount,
}

impl fmt::Display for BalanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Balance of address {} is: {} ETH", self.address, self.balance)?;
        writeln!(f, "Balance is: {} wei", self.balance.value)?;
        write!(f, "Balance is: {} ETH", self.balance)
    }
}

pub async fn run(chain: &dyn Chain, address: Address) -> DemoResult<BalanceReport> {
    info!("Fetching balance of {}", address);
    let wei = chain.balance(address).await?;

    Ok(BalanceReport {
        address,
        balance: Amount::ether(wei),
    })
}
