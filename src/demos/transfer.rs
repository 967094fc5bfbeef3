use alloy::{
    primitives::{Address, U256},
    rpc::types::TransactionRequest,
};
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::DemoResult;
use crate::ethereum::{
    contract::ensure_success,
    provider::SigningChain,
    units::{self, Amount},
    TransactionInfo,
};

#[derive(Debug, Clone, Serialize)]
pub struct TransferReport {
    pub sender: Address,
    pub receiver: Address,
    pub amount: Amount,
    #[serde(serialize_with = "units::decimal")]
    pub sender_before: U256,
    #[serde(serialize_with = "units::decimal")]
    pub receiver_before: U256,
    pub transaction: TransactionInfo,
    #[serde(serialize_with = "units::decimal")]
    pub sender_after: U256,
    #[serde(serialize_with = "units::decimal")]
    pub receiver_after: U256,
    pub explorer_url: Option<String>,
}

impl fmt::Display for TransferReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let eth = Amount::ether;
        let tx = &self.transaction;

        writeln!(f, "Sender balance before: {} ETH", eth(self.sender_before))?;
        writeln!(f, "Receiver balance before: {} ETH", eth(self.receiver_before))?;
        writeln!(f, "Sent {} ETH from {} to {}", self.amount, self.sender, self.receiver)?;
        writeln!(f, "Transaction:")?;
        writeln!(f, "  hash:      0x{:x}", tx.hash)?;
        if let Some(nonce) = tx.nonce {
            writeln!(f, "  nonce:     {}", nonce)?;
        }
        writeln!(f, "  from:      {}", tx.from)?;
        if let Some(to) = tx.to {
            writeln!(f, "  to:        {}", to)?;
        }
        writeln!(f, "  value:     {} wei", tx.value)?;
        writeln!(f, "  data:      {}", tx.input)?;
        if let Some(chain_id) = tx.chain_id {
            writeln!(f, "  chain id:  {}", chain_id)?;
        }
        writeln!(f, "Receipt:")?;
        writeln!(f, "  block:     {}", tx.block_number.unwrap_or_default())?;
        writeln!(f, "  status:    {}", if tx.status { 1 } else { 0 })?;
        writeln!(f, "  gas used:  {}", tx.gas_used)?;
        writeln!(f, "  gas price: {} wei", tx.effective_gas_price)?;
        writeln!(f, "  fee:       {} ETH", eth(tx.fee()))?;
        writeln!(f, "Transaction successful with hash: 0x{:x}", tx.hash)?;
        if let Some(url) = &self.explorer_url {
            writeln!(f, "Explorer: {}", url)?;
        }
        writeln!(f, "Sender balance after: {} ETH", eth(self.sender_after))?;
        write!(f, "Receiver balance after: {} ETH", eth(self.receiver_after))
    }
}

/// Sends `amount` wei from the signing account to `receiver` and reads both
/// balances before and after.
pub async fn run(
    chain: &dyn SigningChain,
    receiver: Address,
    amount: Amount,
) -> DemoResult<TransferReport> {
    let sender = chain.sender();

    let sender_before = chain.balance(sender).await?;
    let receiver_before = chain.balance(receiver).await?;
    info!("Sender balance before: {} ETH", Amount::ether(sender_before));
    info!("Receiver balance before: {} ETH", Amount::ether(receiver_before));

    let request = TransactionRequest::default()
        .to(receiver)
        .value(amount.value);

    info!("Sending {} ETH to {}", amount, receiver);
    let transaction = chain.send_and_confirm(request).await?;
    ensure_success(&transaction)?;

    let sender_after = chain.balance(sender).await?;
    let receiver_after = chain.balance(receiver).await?;

    Ok(TransferReport {
        sender,
        receiver,
        amount,
        sender_before,
        receiver_before,
        transaction,
        sender_after,
        receiver_after,
        explorer_url: None,
    })
}
