//! Inputs the demos use when no flag overrides them.

/// Account whose native balance `balance` looks up.
pub const DEMO_ACCOUNT: &str = "0x396343362be2A4dA1cE0C1C210945346fb82Aa49";

/// Second development account; receives value in `transfer` and tokens in `write`.
pub const RECEIVER: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
pub const USDC_HOLDER: &str = "0x38AAEF3782910bdd9eA3566C839788Af6FF9B200";

/// In ether.
pub const TRANSFER_AMOUNT: &str = "1";
/// In whole tokens, scaled by `decimals()` before sending.
pub const TOKEN_TRANSFER_AMOUNT: &str = "2";

pub const EVENT_NAME: &str = "Transfer";
/// Latest block and its predecessor.
pub const EVENT_BLOCK_SPAN: u64 = 2;
