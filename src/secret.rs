use alloy::signers::local::PrivateKeySigner;
use dialoguer::{theme::ColorfulTheme, Password};
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroizing;

use crate::error::{DemoError, DemoResult};

/// A private key typed by the operator. The buffer is wiped when dropped.
pub struct SecretKey(Zeroizing<String>);

impl SecretKey {
    pub fn new(key: Zeroizing<String>) -> Self {
        Self(key)
    }

    /// Wraps operator input, rejecting a blank entry.
    pub fn from_entry(entry: Zeroizing<String>) -> DemoResult<Self> {
        if entry.trim().is_empty() {
            return Err(DemoError::InvalidInput("No private key entered".to_string()));
        }
        Ok(Self::new(entry))
    }

    /// Consumes the secret. The text form is wiped whether or not parsing
    /// succeeds; the returned signer wipes its own key on drop.
    pub fn into_signer(self) -> DemoResult<PrivateKeySigner> {
        let key = self.0.trim();
        let key = key.strip_prefix("0x").unwrap_or(key);

        PrivateKeySigner::from_str(key)
            .map_err(|e| DemoError::InvalidInput(format!("Invalid private key: {}", e)))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

/// Reads the key from the terminal without echoing it.
pub fn prompt_for_key() -> DemoResult<SecretKey> {
    let entered = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Enter Private Key")
        .interact()
        .map_err(|dialoguer::Error::IO(e)| e)?;

    SecretKey::from_entry(Zeroizing::new(entered))
}
