use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::{DemoError, DemoResult};
use crate::ethereum::{
    contract::{expect_string, expect_uint, Contract},
    provider::Chain,
    units::Amount,
};

#[derive(Debug, Clone, Serialize)]
pub struct TokenReport {
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Amount,
    pub holder: Address,
    pub holder_balance: Amount,
}

impl fmt::Display for TokenReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Token Name: {}", self.name)?;
        writeln!(f, "Token Symbol: {}", self.symbol)?;
        writeln!(f, "Token Decimals: {}", self.decimals)?;
        writeln!(f, "Token Total Supply: {} {}", self.total_supply, self.symbol)?;
        write!(
            f,
            "Balance of Holder ({}): {} {}",
            self.holder, self.holder_balance, self.symbol
        )
    }
}

/// Reads `decimals()` and narrows it to the `uint8` the standard promises.
pub async fn token_decimals<C: Chain + ?Sized>(chain: &C, contract: &Contract) -> DemoResult<u8> {
    let raw = expect_uint(&contract.call_single(chain, "decimals", &[]).await?, "decimals")?;
    if raw > U256::from(u8::MAX) {
        return Err(DemoError::Semantic(format!(
            "Token at {} reports {} decimals",
            contract.address(),
            raw
        )));
    }
    Ok(raw.saturating_to::<u8>())
}

pub async fn token_balance<C: Chain + ?Sized>(
    chain: &C,
    contract: &Contract,
    account: Address,
) -> DemoResult<U256> {
    let value = contract
        .call_single(chain, "balanceOf", &[DynSolValue::Address(account)])
        .await?;
    expect_uint(&value, "balanceOf")
}

pub async fn run(chain: &dyn Chain, contract: &Contract, holder: Address) -> DemoResult<TokenReport> {
    info!("Reading token state from {}", contract.address());

    let name = expect_string(&contract.call_single(chain, "name", &[]).await?, "name")?;
    let symbol = expect_string(&contract.call_single(chain, "symbol", &[]).await?, "symbol")?;
    let decimals = token_decimals(chain, contract).await?;
    let total_supply = expect_uint(
        &contract.call_single(chain, "totalSupply", &[]).await?,
        "totalSupply",
    )?;

    let balance = token_balance(chain, contract, holder).await?;

    Ok(TokenReport {
        token: contract.address(),
        name,
        symbol,
        decimals,
        total_supply: Amount::new(total_supply, decimals),
        holder,
        holder_balance: Amount::new(balance, decimals),
    })
}
