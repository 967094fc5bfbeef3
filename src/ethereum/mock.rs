//! Deterministic in-memory ledger standing in for a node in tests.

use alloy::{
    primitives::{self, address, keccak256, Address, Bytes, B256, U256},
    rpc::types::{Filter, Log, TransactionRequest},
    sol,
    sol_types::{SolCall, SolEvent, SolInterface},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{
    provider::{await_confirmation, Chain, SigningChain},
    TransactionInfo,
};
use crate::error::{DemoError, DemoResult};

sol! {
    interface IERC20 {
        function name() external view returns (string);
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function totalSupply() external view returns (uint256);
        function balanceOf(address) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);

        event Transfer(address indexed from, address indexed to, uint256 amount);
    }
}

pub const USDC: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");
pub const SENDER: Address = address!("3C44CdDdB6a900fa2b585dd299e03d12FA4293BC");

pub const GAS_PRICE: u128 = 2;
pub const TRANSFER_GAS: u64 = 21_000;
pub const TOKEN_TRANSFER_GAS: u64 = 51_000;
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct Token {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: U256,
    balances: HashMap<Address, U256>,
}

#[derive(Debug, Default)]
struct Ledger {
    block_number: u64,
    nonce: u64,
    balances: HashMap<Address, U256>,
    tokens: HashMap<Address, Token>,
    logs: Vec<Log>,
}

#[derive(Debug)]
pub struct MockChain {
    chain_id: u64,
    sender: Address,
    ledger: Mutex<Ledger>,
    offline: AtomicBool,
    honor_block_range: AtomicBool,
    mine_reverted: AtomicBool,
    never_confirm: AtomicBool,
}

impl MockChain {
    pub fn new(chain_id: u64, block_number: u64) -> Self {
        Self {
            chain_id,
            sender: SENDER,
            ledger: Mutex::new(Ledger {
                block_number,
                ..Default::default()
            }),
            offline: AtomicBool::new(false),
            honor_block_range: AtomicBool::new(true),
            mine_reverted: AtomicBool::new(false),
            never_confirm: AtomicBool::new(false),
        }
    }

    /// Every request fails as if the endpoint refused the connection.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Return every matching log regardless of the requested block range.
    pub fn ignore_block_range(&self) {
        self.honor_block_range.store(false, Ordering::SeqCst);
    }

    /// Transactions are mined with status 0: gas is charged, nothing else
    /// changes.
    pub fn mine_reverted(&self) {
        self.mine_reverted.store(true, Ordering::SeqCst);
    }

    /// Transactions are accepted but never mined.
    pub fn never_confirm(&self) {
        self.never_confirm.store(true, Ordering::SeqCst);
    }

    pub fn nonce(&self) -> u64 {
        self.ledger.lock().unwrap().nonce
    }

    pub fn fund(&self, account: Address, wei: U256) {
        self.ledger.lock().unwrap().balances.insert(account, wei);
    }

    pub fn deploy_usdc(&self, holders: &[(Address, U256)]) {
        let balances: HashMap<Address, U256> = holders.iter().copied().collect();
        let total_supply = balances.values().copied().fold(U256::ZERO, |a, b| a + b);

        self.ledger.lock().unwrap().tokens.insert(
            USDC,
            Token {
                name: "USD Coin".to_string(),
                symbol: "USDC".to_string(),
                decimals: 6,
                total_supply,
                balances,
            },
        );
    }

    pub fn token_balance(&self, token: Address, account: Address) -> U256 {
        let ledger = self.ledger.lock().unwrap();
        ledger
            .tokens
            .get(&token)
            .and_then(|t| t.balances.get(&account).copied())
            .unwrap_or_default()
    }

    pub fn push_transfer_log(&self, token: Address, from: Address, to: Address, amount: U256, block: u64) {
        let mut ledger = self.ledger.lock().unwrap();
        let index = ledger.logs.len() as u64;
        let hash = keccak256(format!("log-{}", index));
        ledger.logs.push(transfer_log(token, from, to, amount, block, hash, index));
    }

    fn check_online(&self) -> DemoResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(DemoError::from_rpc(
                "error sending request for url (http://127.0.0.1:8545/): connection refused",
            ))
        } else {
            Ok(())
        }
    }
}

fn transfer_log(
    token: Address,
    from: Address,
    to: Address,
    amount: U256,
    block: u64,
    transaction_hash: B256,
    log_index: u64,
) -> Log {
    let event = IERC20::Transfer { from, to, amount };
    Log {
        inner: primitives::Log {
            address: token,
            data: event.encode_log_data(),
        },
        block_number: Some(block),
        transaction_hash: Some(transaction_hash),
        log_index: Some(log_index),
        ..Default::default()
    }
}

fn request_parts(tx: &TransactionRequest) -> (Option<Address>, Bytes) {
    let to = tx.to.and_then(|kind| kind.to().copied());
    let input = tx.input.input().cloned().unwrap_or_default();
    (to, input)
}

fn revert(reason: &str) -> DemoError {
    DemoError::from_rpc(format!("server returned an error response: execution reverted: {}", reason))
}

impl Token {
    fn view(&self, call: IERC20::IERC20Calls) -> DemoResult<Vec<u8>> {
        use IERC20::IERC20Calls as Calls;

        Ok(match call {
            Calls::name(_) => IERC20::nameCall::abi_encode_returns(&(self.name.clone(),)),
            Calls::symbol(_) => IERC20::symbolCall::abi_encode_returns(&(self.symbol.clone(),)),
            Calls::decimals(_) => IERC20::decimalsCall::abi_encode_returns(&(self.decimals,)),
            Calls::totalSupply(_) => {
                IERC20::totalSupplyCall::abi_encode_returns(&(self.total_supply,))
            }
            Calls::balanceOf(c) => IERC20::balanceOfCall::abi_encode_returns(&(self
                .balances
                .get(&c._0)
                .copied()
                .unwrap_or_default(),)),
            Calls::transfer(c) => {
                let available = self.balances.get(&SENDER).copied().unwrap_or_default();
                if available < c.amount {
                    return Err(revert("ERC20: transfer amount exceeds balance"));
                }
                IERC20::transferCall::abi_encode_returns(&(true,))
            }
        })
    }

    fn transfer(&mut self, from: Address, to: Address, amount: U256) -> DemoResult<()> {
        let available = self.balances.get(&from).copied().unwrap_or_default();
        if available < amount {
            return Err(revert("ERC20: transfer amount exceeds balance"));
        }
        self.balances.insert(from, available - amount);
        *self.balances.entry(to).or_default() += amount;
        Ok(())
    }
}

#[async_trait]
impl Chain for MockChain {
    async fn chain_id(&self) -> DemoResult<u64> {
        self.check_online()?;
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> DemoResult<u64> {
        self.check_online()?;
        Ok(self.ledger.lock().unwrap().block_number)
    }

    async fn balance(&self, address: Address) -> DemoResult<U256> {
        self.check_online()?;
        Ok(self
            .ledger
            .lock()
            .unwrap()
            .balances
            .get(&address)
            .copied()
            .unwrap_or_default())
    }

    async fn call(&self, tx: &TransactionRequest) -> DemoResult<Bytes> {
        self.check_online()?;
        let (to, input) = request_parts(tx);
        let ledger = self.ledger.lock().unwrap();

        // Plain accounts have no code and answer every call with empty data.
        let Some(token) = to.and_then(|to| ledger.tokens.get(&to)) else {
            return Ok(Bytes::new());
        };

        let call = IERC20::IERC20Calls::abi_decode(&input, false).map_err(|_| revert(""))?;
        Ok(token.view(call)?.into())
    }

    async fn logs(&self, filter: &Filter) -> DemoResult<Vec<Log>> {
        self.check_online()?;
        let ledger = self.ledger.lock().unwrap();
        let honor_range = self.honor_block_range.load(Ordering::SeqCst);
        let from = filter.get_from_block().unwrap_or(0);
        let to = filter.get_to_block().unwrap_or(ledger.block_number);

        Ok(ledger
            .logs
            .iter()
            .filter(|log| filter.address.matches(&log.address()))
            .filter(|log| match log.topics().first() {
                Some(topic0) => filter.topics[0].matches(topic0),
                None => filter.topics[0].is_empty(),
            })
            .filter(|log| {
                let block = log.block_number.unwrap_or_default();
                !honor_range || (from..=to).contains(&block)
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SigningChain for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn send_and_confirm(&self, tx: TransactionRequest) -> DemoResult<TransactionInfo> {
        self.check_online()?;

        if self.never_confirm.load(Ordering::SeqCst) {
            let hash = {
                let ledger = self.ledger.lock().unwrap();
                keccak256(format!("tx-{}-{}", self.sender, ledger.nonce))
            };
            let never = std::future::pending::<DemoResult<TransactionInfo>>();
            return await_confirmation(never, CONFIRMATION_TIMEOUT, hash).await;
        }

        self.mine(tx)
    }
}

impl MockChain {
    fn mine(&self, tx: TransactionRequest) -> DemoResult<TransactionInfo> {
        let (to, input) = request_parts(&tx);
        let to = to.ok_or_else(|| revert("contract creation is not supported"))?;
        let value = tx.value.unwrap_or_default();
        let reverted = self.mine_reverted.load(Ordering::SeqCst);

        let mut guard = self.ledger.lock().unwrap();
        let ledger = &mut *guard;
        let is_token = ledger.tokens.contains_key(&to);
        let gas_used = if is_token { TOKEN_TRANSFER_GAS } else { TRANSFER_GAS };
        let fee = U256::from(gas_used) * U256::from(GAS_PRICE);

        let sender_balance = ledger.balances.get(&self.sender).copied().unwrap_or_default();
        if sender_balance < value + fee {
            return Err(DemoError::from_rpc(
                "insufficient funds for gas * price + value",
            ));
        }

        let nonce = ledger.nonce;
        let block = ledger.block_number + 1;
        let hash = keccak256(format!("tx-{}-{}", self.sender, nonce));

        if is_token && !reverted {
            let call = IERC20::IERC20Calls::abi_decode(&input, false).map_err(|_| revert(""))?;
            let IERC20::IERC20Calls::transfer(call) = call else {
                return Err(revert("only transfer is writable"));
            };
            if let Some(token) = ledger.tokens.get_mut(&to) {
                token.transfer(self.sender, call.to, call.amount)?;
            }
            let index = ledger.logs.len() as u64;
            ledger
                .logs
                .push(transfer_log(to, self.sender, call.to, call.amount, block, hash, index));
        }

        ledger.nonce += 1;
        ledger.block_number = block;
        let moved = if reverted { U256::ZERO } else { value };
        ledger.balances.insert(self.sender, sender_balance - moved - fee);
        *ledger.balances.entry(to).or_default() += moved;

        Ok(TransactionInfo {
            hash,
            nonce: Some(nonce),
            chain_id: Some(self.chain_id),
            from: self.sender,
            to: Some(to),
            value,
            input,
            gas_used,
            effective_gas_price: GAS_PRICE,
            block_number: Some(block),
            status: !reverted,
        })
    }
}
