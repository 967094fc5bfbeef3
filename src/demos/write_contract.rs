use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, U256},
};
use serde::Serialize;
use std::fmt;
use tracing::info;

use super::read_contract::{token_balance, token_decimals};
use crate::error::DemoResult;
use crate::ethereum::{
    contract::Contract,
    provider::SigningChain,
    units::{self, Amount},
    TransactionInfo,
};

#[derive(Debug, Clone, Serialize)]
pub struct TokenTransferReport {
    pub token: Address,
    pub sender: Address,
    pub receiver: Address,
    pub amount: Amount,
    #[serde(serialize_with = "units::decimal")]
    pub sender_before: U256,
    #[serde(serialize_with = "units::decimal")]
    pub receiver_before: U256,
    pub transaction: TransactionInfo,
    pub calldata: String,
    #[serde(serialize_with = "units::decimal")]
    pub sender_after: U256,
    #[serde(serialize_with = "units::decimal")]
    pub receiver_after: U256,
}

impl fmt::Display for TokenTransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tx = &self.transaction;

        writeln!(f, "\nReading from {}\n", self.token)?;
        writeln!(f, "Sender balance before: {}\n", self.sender_before)?;
        writeln!(f, "Receiver balance before: {}\n", self.receiver_before)?;
        writeln!(f, "Transaction:")?;
        writeln!(f, "  hash:  0x{:x}", tx.hash)?;
        if let Some(nonce) = tx.nonce {
            writeln!(f, "  nonce: {}", nonce)?;
        }
        writeln!(f, "  from:  {}", tx.from)?;
        writeln!(f, "  to:    {}", self.token)?;
        writeln!(f, "  data:  {}", self.calldata)?;
        writeln!(f, "  value: {}", tx.value)?;
        writeln!(f, "  block: {}", tx.block_number.unwrap_or_default())?;
        writeln!(f, "  gas used: {}", tx.gas_used)?;
        writeln!(f, "\nBalance of sender: {}", self.sender_after)?;
        writeln!(f, "Balance of receiver: {}", self.receiver_after)
    }
}

/// Transfers `amount` whole tokens (e.g. "2") from the signing account to
/// `receiver`. The amount is scaled by the token's own `decimals()`.
pub async fn run(
    chain: &dyn SigningChain,
    contract: &Contract,
    receiver: Address,
    amount: &str,
) -> DemoResult<TokenTransferReport> {
    let sender = chain.sender();

    let sender_before = token_balance(chain, contract, sender).await?;
    let receiver_before = token_balance(chain, contract, receiver).await?;
    info!("Sender token balance before: {}", sender_before);
    info!("Receiver token balance before: {}", receiver_before);

    let decimals = token_decimals(chain, contract).await?;
    let amount = Amount::parse(amount, decimals)?;

    let args = [
        DynSolValue::Address(receiver),
        DynSolValue::Uint(amount.value, 256),
    ];
    let calldata = contract.encode_call("transfer", &args)?;

    info!("Transferring {} tokens ({} base units) to {}", amount, amount.value, receiver);
    let transaction = contract.send(chain, "transfer", &args).await?;

    let sender_after = token_balance(chain, contract, sender).await?;
    let receiver_after = token_balance(chain, contract, receiver).await?;

    Ok(TokenTransferReport {
        token: contract.address(),
        sender,
        receiver,
        amount,
        sender_before,
        receiver_before,
        transaction,
        calldata: format!("0x{}", hex::encode(&calldata)),
        sender_after,
        receiver_after,
    })
}
