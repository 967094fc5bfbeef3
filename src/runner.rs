use alloy::{
    primitives::{Address, B256},
    providers::RootProvider,
    transports::http::{Client, Http},
};
use anyhow::Result;
use serde::Serialize;
use std::fmt::Display;
use std::path::Path;
use tracing::info;

use crate::{
    config::Config,
    demos::{balance, events, read_contract, transfer, write_contract, Demo},
    ethereum::{
        abi::{self, ERC20_EVENTS_ABI, ERC20_READ_ABI, ERC20_WRITE_ABI},
        contract::Contract,
        provider::{ProviderManager, RpcChain, SigningChain},
        units::{Amount, ETHER_DECIMALS},
        utils,
    },
    secret::prompt_for_key,
};

#[derive(Debug)]
pub struct DemoRunner {
    config: Config,
    providers: ProviderManager,
    network: Option<String>,
    json: bool,
}

impl DemoRunner {
    pub fn new(config: Config, network: Option<String>, json: bool) -> Self {
        let providers = ProviderManager::new(config.clone());
        Self {
            config,
            providers,
            network,
            json,
        }
    }

    pub fn network_for(&self, demo: &Demo) -> String {
        select_network(&self.config, self.network.as_deref(), demo)
    }

    pub async fn run(&self, demo: Demo) -> Result<()> {
        let network = self.network_for(&demo);

        // Configuration problems surface before any prompt or request.
        self.providers.endpoint_url(&network)?;
        info!("Running {} demo on {}", demo.name(), network);

        match demo {
            Demo::Balance { address } => {
                let chain = self.connect(&network).await?;
                let report = balance::run(&chain, address).await?;
                self.emit(&report)
            }
            Demo::Transfer { receiver, amount } => {
                let amount = Amount::parse(&amount, ETHER_DECIMALS)?;
                let chain = self.connect_signing(&network).await?;
                let mut report = transfer::run(chain.as_ref(), receiver, amount).await?;
                report.explorer_url = self.explorer_link(&network, &report.transaction.hash);
                self.emit(&report)
            }
            Demo::ReadContract { token, holder, abi } => {
                let contract = load_contract(token, abi.as_deref(), ERC20_READ_ABI).await?;
                let chain = self.connect(&network).await?;
                let report = read_contract::run(&chain, &contract, holder).await?;
                self.emit(&report)
            }
            Demo::WriteContract {
                token,
                receiver,
                amount,
                abi,
            } => {
                let contract = load_contract(token, abi.as_deref(), ERC20_WRITE_ABI).await?;
                let chain = self.connect_signing(&network).await?;
                let report =
                    write_contract::run(chain.as_ref(), &contract, receiver, &amount).await?;
                self.emit(&report)
            }
            Demo::Events {
                token,
                event,
                blocks,
                abi,
            } => {
                let contract = load_contract(token, abi.as_deref(), ERC20_EVENTS_ABI).await?;
                let chain = self.connect(&network).await?;
                let report = events::run(&chain, &contract, &event, blocks).await?;
                self.emit(&report)
            }
        }
    }

    async fn connect(&self, network: &str) -> Result<RpcChain<RootProvider<Http<Client>>>> {
        let chain = self.providers.connect(network)?;
        self.providers
            .validate_network_connection(network, &chain)
            .await?;
        Ok(chain)
    }

    /// Prompts for the key right before it is needed. The signer moves into
    /// the returned handle and is wiped when the demo drops it.
    async fn connect_signing(&self, network: &str) -> Result<Box<dyn SigningChain>> {
        let signer = prompt_for_key()?.into_signer()?;

        let chain = self.providers.connect_signing(network, signer)?;
        self.providers
            .validate_network_connection(network, chain.as_ref())
            .await?;
        Ok(chain)
    }

    fn explorer_link(&self, network: &str, hash: &B256) -> Option<String> {
        let explorer = self.config.network(network).ok()?.explorer_url.as_deref()?;
        Some(utils::explorer_tx_url(explorer, hash))
    }

    fn emit<R: Serialize + Display>(&self, report: &R) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(report)?);
        } else {
            println!("{}", report);
        }
        Ok(())
    }
}

/// Signing demos default to the signing network, the rest to the default
/// network, unless one was named explicitly.
pub fn select_network(config: &Config, network: Option<&str>, demo: &Demo) -> String {
    match network {
        Some(network) => network.to_string(),
        None if demo.signs() => config.signing_network.clone(),
        None => config.default_network.clone(),
    }
}

async fn load_contract(
    token: Address,
    abi_path: Option<&Path>,
    default_interface: &[&str],
) -> Result<Contract> {
    let contract = match abi_path {
        Some(path) => Contract::new(token, abi::load_interface(path).await?),
        None => Contract::from_signatures(token, default_interface)?,
    };
    Ok(contract)
}
