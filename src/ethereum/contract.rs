use alloy::{
    dyn_abi::{DynSolValue, EventExt, FunctionExt, JsonAbiExt},
    json_abi::{Event, Function, JsonAbi},
    primitives::{Address, Bytes, U256},
    rpc::types::{Filter, Log, TransactionRequest},
};
use serde_json::Value;
use tracing::{debug, warn};

use super::{EventInfo, TransactionInfo};
use crate::error::{DemoError, DemoResult};
use crate::ethereum::{
    abi,
    provider::{Chain, SigningChain},
    utils,
};

/// A deployed contract seen through an interface description.
#[derive(Debug, Clone)]
pub struct Contract {
    address: Address,
    abi: JsonAbi,
}

impl Contract {
    pub fn new(address: Address, abi: JsonAbi) -> Self {
        Self { address, abi }
    }

    pub fn from_signatures(address: Address, signatures: &[&str]) -> DemoResult<Self> {
        let abi = abi::parse_interface(signatures.iter().copied())?;
        Ok(Self::new(address, abi))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn function(&self, name: &str) -> DemoResult<&Function> {
        utils::validate_identifier(name)?;

        self.abi.functions().find(|f| f.name == name).ok_or_else(|| {
            let available: Vec<String> = self.abi.functions().map(|f| f.name.clone()).collect();

            if available.is_empty() {
                DemoError::Semantic(format!(
                    "Function '{}' not found. The contract interface contains no functions.",
                    name
                ))
            } else {
                DemoError::Semantic(format!(
                    "Function '{}' not found in contract interface. Available functions: {}",
                    name,
                    available.join(", ")
                ))
            }
        })
    }

    pub fn event(&self, name: &str) -> DemoResult<&Event> {
        utils::validate_identifier(name)?;

        self.abi.events().find(|e| e.name == name).ok_or_else(|| {
            let available: Vec<String> = self.abi.events().map(|e| e.name.clone()).collect();
            DemoError::Semantic(format!(
                "Event '{}' not found in contract interface. Available events: {}",
                name,
                if available.is_empty() {
                    "none".to_string()
                } else {
                    available.join(", ")
                }
            ))
        })
    }

    /// Encode function parameters for a contract call
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> DemoResult<Bytes> {
        let function = self.function(name)?;

        if args.len() != function.inputs.len() {
            let expected: Vec<String> = function
                .inputs
                .iter()
                .map(|input| format!("{} {}", input.ty, input.name).trim().to_string())
                .collect();

            return Err(DemoError::InvalidInput(format!(
                "Parameter count mismatch for function '{}': expected {} parameters, got {}. Expected parameters: [{}]",
                function.name,
                function.inputs.len(),
                args.len(),
                expected.join(", ")
            )));
        }

        let encoded = function
            .abi_encode_input(args)
            .map_err(|e| DemoError::InvalidInput(format!("Failed to encode inputs of '{}': {}", name, e)))?;

        Ok(encoded.into())
    }

    fn decode_output(&self, function: &Function, result: &Bytes) -> DemoResult<Vec<DynSolValue>> {
        if result.is_empty() && !function.outputs.is_empty() {
            return Err(DemoError::Semantic(format!(
                "Call to '{}' at {} returned no data. Is the interface right for this address?",
                function.name, self.address
            )));
        }

        function.abi_decode_output(result, false).map_err(|e| {
            DemoError::Semantic(format!(
                "Failed to decode result of '{}' (0x{}): {}",
                function.name,
                hex::encode(result),
                e
            ))
        })
    }

    /// Runs a view function with `eth_call` and decodes its outputs.
    pub async fn call_view<C: Chain + ?Sized>(
        &self,
        chain: &C,
        name: &str,
        args: &[DynSolValue],
    ) -> DemoResult<Vec<DynSolValue>> {
        let function = self.function(name)?;
        let calldata = self.encode_call(name, args)?;

        let request = TransactionRequest::default()
            .to(self.address)
            .input(calldata.into());

        let result = chain.call(&request).await?;
        debug!("{}() returned {} bytes", name, result.len());

        self.decode_output(function, &result)
    }

    /// Like [`Contract::call_view`] for functions returning one value.
    pub async fn call_single<C: Chain + ?Sized>(
        &self,
        chain: &C,
        name: &str,
        args: &[DynSolValue],
    ) -> DemoResult<DynSolValue> {
        self.call_view(chain, name, args)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DemoError::Semantic(format!("'{}' returned no values", name)))
    }

    /// Encodes, signs and submits a state-changing call, then waits for it.
    pub async fn send<C: SigningChain + ?Sized>(
        &self,
        chain: &C,
        name: &str,
        args: &[DynSolValue],
    ) -> DemoResult<TransactionInfo> {
        let calldata = self.encode_call(name, args)?;
        debug!("{} calldata: 0x{}", name, hex::encode(&calldata));

        let request = TransactionRequest::default()
            .to(self.address)
            .input(calldata.into());

        let info = chain.send_and_confirm(request).await?;
        ensure_success(&info)?;
        Ok(info)
    }

    /// Fetches and decodes every `event_name` log emitted by this contract
    /// in the inclusive block range.
    pub async fn query_filter<C: Chain + ?Sized>(
        &self,
        chain: &C,
        event_name: &str,
        from_block: u64,
        to_block: u64,
    ) -> DemoResult<Vec<EventInfo>> {
        if from_block > to_block {
            return Err(DemoError::InvalidInput(format!(
                "Invalid block range: {} is after {}",
                from_block, to_block
            )));
        }

        let event = self.event(event_name)?;
        let filter = Filter::new()
            .address(self.address)
            .event_signature(event.selector())
            .from_block(from_block)
            .to_block(to_block);

        let logs = chain.logs(&filter).await?;
        debug!("Node returned {} logs for {}", logs.len(), event_name);

        let mut events = Vec::with_capacity(logs.len());
        for (index, log) in logs.into_iter().enumerate() {
            match log.block_number {
                Some(block) if block < from_block || block > to_block => {
                    warn!(
                        "Dropping log from block {} outside requested range {}..={}",
                        block, from_block, to_block
                    );
                    continue;
                }
                _ => {}
            }
            events.push(decode_event(event, &log, index as u64)?);
        }

        Ok(events)
    }
}

fn decode_event(event: &Event, log: &Log, fallback_index: u64) -> DemoResult<EventInfo> {
    let decoded = event.decode_log(log.data(), true).map_err(|e| {
        DemoError::Semantic(format!("Failed to decode {} log: {}", event.name, e))
    })?;

    let mut indexed = decoded.indexed.iter();
    let mut body = decoded.body.iter();
    let args = event
        .inputs
        .iter()
        .filter_map(|param| {
            if param.indexed {
                indexed.next()
            } else {
                body.next()
            }
        })
        .map(value_to_json)
        .collect();

    Ok(EventInfo {
        address: format!("0x{:x}", log.address()),
        topics: log.topics().iter().map(|t| format!("0x{:x}", t)).collect(),
        data: format!("0x{}", hex::encode(&log.data().data)),
        block_number: log.block_number.unwrap_or_default(),
        transaction_hash: format!("0x{:x}", log.transaction_hash.unwrap_or_default()),
        log_index: log.log_index.unwrap_or(fallback_index),
        removed: log.removed,
        event: event.name.clone(),
        args: Value::Array(args),
    })
}

/// A mined transaction with status 0 reverted.
pub fn ensure_success(info: &TransactionInfo) -> DemoResult<()> {
    if info.status {
        Ok(())
    } else {
        Err(DemoError::Semantic(format!(
            "Transaction 0x{:x} was mined in block {} but reverted",
            info.hash,
            info.block_number.unwrap_or_default()
        )))
    }
}

/// Convert single DynSolValue to JSON
pub fn value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Address(addr) => Value::String(format!("0x{:x}", addr)),
        DynSolValue::Uint(num, _) => Value::String(num.to_string()),
        DynSolValue::Int(num, _) => Value::String(num.to_string()),
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Bytes(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(format!("0x{}", hex::encode(&word[..*size])))
        }
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(value_to_json).collect())
        }
        other => Value::String(format!("{:?}", other)),
    }
}

pub fn expect_uint(value: &DynSolValue, what: &str) -> DemoResult<U256> {
    value
        .as_uint()
        .map(|(n, _)| n)
        .ok_or_else(|| DemoError::Semantic(format!("{} is not an unsigned integer: {:?}", what, value)))
}

pub fn expect_string(value: &DynSolValue, what: &str) -> DemoResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| DemoError::Semantic(format!("{} is not a string: {:?}", what, value)))
}
