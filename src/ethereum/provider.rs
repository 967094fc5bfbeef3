use crate::config::{Config, NetworkConfig};
use crate::error::{DemoError, DemoResult};
use crate::ethereum::TransactionInfo;
use alloy::{
    consensus::Transaction as _,
    network::{EthereumWallet, ReceiptResponse},
    primitives::{Address, Bytes, B256, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::types::{Filter, Log, TransactionRequest},
    signers::local::PrivateKeySigner,
    transports::http::{reqwest::Url, Client, Http},
};
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The read side of a node connection.
#[async_trait]
pub trait Chain: Send + Sync {
    async fn chain_id(&self) -> DemoResult<u64>;

    async fn block_number(&self) -> DemoResult<u64>;

    async fn balance(&self, address: Address) -> DemoResult<U256>;

    /// `eth_call` against the latest block.
    async fn call(&self, tx: &TransactionRequest) -> DemoResult<Bytes>;

    async fn logs(&self, filter: &Filter) -> DemoResult<Vec<Log>>;
}

/// A connection that owns a signing key.
#[async_trait]
pub trait SigningChain: Chain {
    fn sender(&self) -> Address;

    /// Signs and broadcasts `tx`, then blocks until its receipt is available.
    async fn send_and_confirm(&self, tx: TransactionRequest) -> DemoResult<TransactionInfo>;
}

#[derive(Debug, Clone)]
pub struct RpcChain<P> {
    provider: P,
}

impl<P> RpcChain<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P> Chain for RpcChain<P>
where
    P: Provider<Http<Client>>,
{
    async fn chain_id(&self) -> DemoResult<u64> {
        self.provider.get_chain_id().await.map_err(DemoError::from_transport)
    }

    async fn block_number(&self) -> DemoResult<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(DemoError::from_transport)
    }

    async fn balance(&self, address: Address) -> DemoResult<U256> {
        debug!("eth_getBalance {:?}", address);
        self.provider
            .get_balance(address)
            .await
            .map_err(DemoError::from_transport)
    }

    async fn call(&self, tx: &TransactionRequest) -> DemoResult<Bytes> {
        self.provider.call(tx).await.map_err(DemoError::from_transport)
    }

    async fn logs(&self, filter: &Filter) -> DemoResult<Vec<Log>> {
        self.provider
            .get_logs(filter)
            .await
            .map_err(DemoError::from_transport)
    }
}

pub struct WalletChain<P> {
    inner: RpcChain<P>,
    sender: Address,
    confirmation_timeout: Duration,
}

#[async_trait]
impl<P> Chain for WalletChain<P>
where
    P: Provider<Http<Client>>,
{
    async fn chain_id(&self) -> DemoResult<u64> {
        self.inner.chain_id().await
    }

    async fn block_number(&self) -> DemoResult<u64> {
        self.inner.block_number().await
    }

    async fn balance(&self, address: Address) -> DemoResult<U256> {
        self.inner.balance(address).await
    }

    async fn call(&self, tx: &TransactionRequest) -> DemoResult<Bytes> {
        self.inner.call(tx).await
    }

    async fn logs(&self, filter: &Filter) -> DemoResult<Vec<Log>> {
        self.inner.logs(filter).await
    }
}

#[async_trait]
impl<P> SigningChain for WalletChain<P>
where
    P: Provider<Http<Client>>,
{
    fn sender(&self) -> Address {
        self.sender
    }

    async fn send_and_confirm(&self, tx: TransactionRequest) -> DemoResult<TransactionInfo> {
        let value = tx.value.unwrap_or_default();
        let tx = tx.from(self.sender);

        let pending = self
            .inner
            .provider
            .send_transaction(tx)
            .await
            .map_err(DemoError::from_transport)?;

        let tx_hash = *pending.tx_hash();
        info!("Transaction sent with hash: {:?}", tx_hash);

        let receipt =
            await_confirmation(pending.get_receipt(), self.confirmation_timeout, tx_hash).await?;

        let mut info = TransactionInfo {
            hash: receipt.transaction_hash,
            nonce: None,
            chain_id: None,
            from: receipt.from,
            to: receipt.to,
            value,
            input: Bytes::new(),
            gas_used: receipt.gas_used as u64,
            effective_gas_price: receipt.effective_gas_price,
            block_number: receipt.block_number,
            status: receipt.status(),
        };

        // The receipt omits what was signed; the filled-in fields live on
        // the mined transaction.
        match self
            .inner
            .provider
            .get_transaction_by_hash(tx_hash)
            .await
            .map_err(DemoError::from_transport)?
        {
            Some(mined) => {
                info.nonce = Some(mined.nonce());
                info.chain_id = mined.chain_id();
                info.input = mined.input().clone();
            }
            None => warn!("Node has a receipt but no transaction for 0x{:x}", tx_hash),
        }

        Ok(info)
    }
}

/// Waits at most `timeout` for a submitted transaction to be confirmed.
pub async fn await_confirmation<T, E, F>(
    confirmation: F,
    timeout: Duration,
    tx_hash: B256,
) -> DemoResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(timeout, confirmation).await {
        Ok(result) => result.map_err(|e| {
            DemoError::from_rpc(format!(
                "Transaction was sent but confirmation failed: {}. Transaction hash: 0x{:x}",
                e, tx_hash
            ))
        }),
        Err(_) => Err(DemoError::ConfirmationTimeout {
            hash: format!("{:x}", tx_hash),
            secs: timeout.as_secs(),
        }),
    }
}

#[derive(Debug)]
pub struct ProviderManager {
    config: Config,
}

impl ProviderManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolves and parses the endpoint of `network` without connecting.
    pub fn endpoint_url(&self, network: &str) -> DemoResult<Url> {
        let rpc_url = self.config.endpoint(network)?;
        rpc_url
            .parse()
            .map_err(|e| DemoError::Config(format!("Invalid RPC URL for '{}': {}", network, e)))
    }

    /// Read-only connection to `network`.
    pub fn connect(&self, network: &str) -> DemoResult<RpcChain<RootProvider<Http<Client>>>> {
        let url = self.endpoint_url(network)?;
        debug!("Connecting to {} at {}", network, url.host_str().unwrap_or("?"));

        let provider = ProviderBuilder::new().on_http(url);
        Ok(RpcChain::new(provider))
    }

    /// Connection to `network` that signs with `signer`. The signer lives
    /// exactly as long as the returned handle.
    pub fn connect_signing(
        &self,
        network: &str,
        signer: PrivateKeySigner,
    ) -> DemoResult<Box<dyn SigningChain>> {
        let url = self.endpoint_url(network)?;
        let sender = signer.address();
        info!("Signing as {:?} on {}", sender, network);

        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .with_recommended_fillers()
            .wallet(wallet)
            .on_http(url);

        Ok(Box::new(WalletChain {
            inner: RpcChain::new(provider),
            sender,
            confirmation_timeout: self.config.confirmation_timeout(),
        }))
    }

    pub fn get_network_config(&self, network: &str) -> DemoResult<&NetworkConfig> {
        self.config.network(network)
    }

    /// Validates network connectivity before a demo starts and returns the
    /// chain id reported by the node.
    pub async fn validate_network_connection<C: Chain + ?Sized>(
        &self,
        network: &str,
        chain: &C,
    ) -> DemoResult<u64> {
        let chain_id = chain.chain_id().await.map_err(|e| match e {
            DemoError::Connectivity(msg) => DemoError::Connectivity(format!(
                "Cannot connect to network '{}': {}",
                network, msg
            )),
            other => other,
        })?;

        match self.get_network_config(network)?.chain_id {
            Some(expected) if expected != chain_id => warn!(
                "Network '{}' is configured with chain id {} but the node reports {}",
                network, expected, chain_id
            ),
            _ => debug!("Connected to {} (chain id {})", network, chain_id),
        }

        Ok(chain_id)
    }
}
