use alloy::primitives::Address;
use serde::Serialize;
use std::fmt;
use tracing::info;

use crate::error::DemoResult;
use crate::ethereum::{contract::Contract, provider::Chain, utils, EventInfo};

#[derive(Debug, Clone, Serialize)]
pub struct EventQueryReport {
    pub token: Address,
    pub event: String,
    pub latest_block: u64,
    pub from_block: u64,
    pub to_block: u64,
    pub events: Vec<EventInfo>,
}

impl fmt::Display for EventQueryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current block number: {}", self.latest_block)?;
        writeln!(
            f,
            "Found {} {} events in blocks {}..={}:",
            self.events.len(),
            self.event,
            self.from_block,
            self.to_block
        )?;

        match self.events.first() {
            Some(first) => {
                let rendered = serde_json::to_string_pretty(first).map_err(|_| fmt::Error)?;
                write!(f, "{}", rendered)
            }
            None => write!(f, "(none)"),
        }
    }
}

/// Queries `event` logs of `contract` over the last `span` blocks.
pub async fn run(
    chain: &dyn Chain,
    contract: &Contract,
    event: &str,
    span: u64,
) -> DemoResult<EventQueryReport> {
    // Fail on an unknown event before touching the network.
    contract.event(event)?;

    let latest_block = chain.block_number().await?;
    info!("Current block number: {}", latest_block);

    let (from_block, to_block) = utils::trailing_block_range(latest_block, span);
    let events = contract
        .query_filter(chain, event, from_block, to_block)
        .await?;

    Ok(EventQueryReport {
        token: contract.address(),
        event: event.to_string(),
        latest_block,
        from_block,
        to_block,
        events,
    })
}
