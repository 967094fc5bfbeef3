use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::error::{DemoError, DemoResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub networks: HashMap<String, NetworkConfig>,
    /// Network used by the read-only demos.
    pub default_network: String,
    /// Network used by the demos that sign and broadcast transactions.
    pub signing_network: String,
    pub transactions: TransactionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub rpc_url: String,
    pub chain_id: Option<u64>,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionConfig {
    pub confirmation_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let mut networks = HashMap::new();

        networks.insert(
            "ethereum".to_string(),
            NetworkConfig {
                rpc_url: "https://eth-mainnet.g.alchemy.com/v2/${ALCHEMY_API_KEY}".to_string(),
                chain_id: Some(1),
                explorer_url: Some("https://etherscan.io".to_string()),
            },
        );

        networks.insert(
            "sepolia".to_string(),
            NetworkConfig {
                rpc_url: "https://eth-sepolia.g.alchemy.com/v2/${ALCHEMY_API_KEY}".to_string(),
                chain_id: Some(11155111),
                explorer_url: Some("https://sepolia.etherscan.io".to_string()),
            },
        );

        // Virtual testnet forked from mainnet, so the chain id is still 1.
        networks.insert(
            "tenderly".to_string(),
            NetworkConfig {
                rpc_url: "${TENDERLY_RPC_URL}".to_string(),
                chain_id: Some(1),
                explorer_url: None,
            },
        );

        Self {
            networks,
            default_network: "ethereum".to_string(),
            signing_network: "tenderly".to_string(),
            transactions: TransactionConfig {
                confirmation_timeout_secs: 120,
            },
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {:?}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {:?}: {}", path, e))?;

        Ok(config)
    }

    /// Load configuration, falling back to the defaults when no file is
    /// given. An explicit file that cannot be read or parsed is an error.
    pub async fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> DemoResult<Self> {
        // Values already in the environment win over the .env file.
        if let Ok(path) = dotenv::dotenv() {
            tracing::debug!("Loaded environment from {:?}", path);
        }

        let mut config = match path {
            Some(path) => {
                let config = Self::load_from_file(path)
                    .await
                    .map_err(|e| DemoError::Config(e.to_string()))?;
                tracing::info!("Loaded configuration from file");
                config
            }
            None => Self::default(),
        };

        config.apply_env_vars();
        Ok(config)
    }

    /// Substitutes `${VAR}` placeholders in RPC URLs with environment values.
    /// Unset variables are left in place and reported by [`Config::endpoint`].
    fn apply_env_vars(&mut self) {
        for (network_name, network_config) in &mut self.networks {
            let resolved = substitute_env(&network_config.rpc_url, |var| std::env::var(var).ok());
            if resolved != network_config.rpc_url {
                tracing::debug!("Resolved environment placeholders in {} RPC URL", network_name);
                network_config.rpc_url = resolved;
            }
        }
    }

    pub fn network(&self, name: &str) -> DemoResult<&NetworkConfig> {
        self.networks.get(name).ok_or_else(|| {
            let mut available: Vec<&str> = self.networks.keys().map(String::as_str).collect();
            available.sort_unstable();
            DemoError::Config(format!(
                "network '{}' is not configured. Available networks: {}",
                name,
                available.join(", ")
            ))
        })
    }

    /// Returns the fully resolved endpoint URL of a network.
    pub fn endpoint(&self, name: &str) -> DemoResult<String> {
        let network = self.network(name)?;
        if let Some(var) = first_placeholder(&network.rpc_url) {
            return Err(DemoError::missing_env(var));
        }
        if network.rpc_url.trim().is_empty() {
            return Err(DemoError::Config(format!(
                "network '{}' has an empty rpc_url",
                name
            )));
        }
        Ok(network.rpc_url.clone())
    }

    pub fn set_rpc_url(&mut self, network: &str, rpc_url: String) {
        self.networks
            .entry(network.to_string())
            .and_modify(|n| n.rpc_url = rpc_url.clone())
            .or_insert(NetworkConfig {
                rpc_url,
                chain_id: None,
                explorer_url: None,
            });
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.transactions.confirmation_timeout_secs)
    }

    /// Get default config file path
    pub fn default_config_path() -> Result<std::path::PathBuf> {
        let config_dir =
            dirs::config_dir().ok_or_else(|| anyhow!("Could not determine config directory"))?;
        Ok(config_dir.join("eth-rpc-demos").join("config.toml"))
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let sample_config = r#"# eth-rpc-demos configuration file

# Network used by balance, read and events
default_network = "ethereum"

# Network used by transfer and write (they sign real transactions)
signing_network = "tenderly"

# ${VAR} placeholders are replaced with environment variables at startup.
[networks.ethereum]
rpc_url = "https://eth-mainnet.g.alchemy.com/v2/${ALCHEMY_API_KEY}"
chain_id = 1
explorer_url = "https://etherscan.io"

[networks.sepolia]
rpc_url = "https://eth-sepolia.g.alchemy.com/v2/${ALCHEMY_API_KEY}"
chain_id = 11155111
explorer_url = "https://sepolia.etherscan.io"

[networks.tenderly]
rpc_url = "${TENDERLY_RPC_URL}"
chain_id = 1

[transactions]
confirmation_timeout_secs = 120

# Environment variables that can be used:
# ALCHEMY_API_KEY - Your Alchemy API key
# TENDERLY_RPC_URL - RPC URL of a Tenderly virtual testnet (or any dev node)
"#;
        sample_config.to_string()
    }
}

fn substitute_env(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let var = &rest[start + 2..start + 2 + len];
        out.push_str(&rest[..start]);
        match lookup(var) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&rest[start..start + 3 + len]),
        }
        rest = &rest[start + 3 + len..];
    }

    out.push_str(rest);
    out
}

fn first_placeholder(template: &str) -> Option<&str> {
    let start = template.find("${")?;
    let len = template[start + 2..].find('}')?;
    Some(&template[start + 2..start + 2 + len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env() {
        let lookup = |var: &str| (var == "KEY").then(|| "abc".to_string());

        assert_eq!(
            substitute_env("https://host/v2/${KEY}", lookup),
            "https://host/v2/abc"
        );
        assert_eq!(substitute_env("${MISSING}", lookup), "${MISSING}");
        assert_eq!(substitute_env("${KEY}-${KEY}", lookup), "abc-abc");
        assert_eq!(substitute_env("no placeholder", lookup), "no placeholder");
        assert_eq!(substitute_env("broken ${KEY", lookup), "broken ${KEY");
    }

    #[test]
    fn test_unresolved_placeholder_is_config_error() {
        let config = Config::default();
        let err = config.endpoint("tenderly").unwrap_err();

        assert!(matches!(err, DemoError::Config(_)));
        assert!(err.to_string().contains("TENDERLY_RPC_URL"));
    }

    #[test]
    fn test_unknown_network() {
        let config = Config::default();
        let err = config.endpoint("solana").unwrap_err();
        assert!(err.to_string().contains("Available networks: ethereum, sepolia, tenderly"));
    }

    #[test]
    fn test_rpc_url_override() {
        let mut config = Config::default();
        config.set_rpc_url("tenderly", "http://127.0.0.1:8545".to_string());
        config.set_rpc_url("anvil", "http://127.0.0.1:8546".to_string());

        assert_eq!(config.endpoint("tenderly").unwrap(), "http://127.0.0.1:8545");
        assert_eq!(config.endpoint("anvil").unwrap(), "http://127.0.0.1:8546");
        assert_eq!(config.network("tenderly").unwrap().chain_id, Some(1));
        assert_eq!(config.network("anvil").unwrap().chain_id, None);
    }

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(&Config::generate_sample()).unwrap();
        assert_eq!(config.default_network, "ethereum");
        assert_eq!(config.signing_network, "tenderly");
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(120));
        assert_eq!(config.networks.len(), 3);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_network = "local"
signing_network = "local"

[networks.local]
rpc_url = "http://localhost:8545"

[transactions]
confirmation_timeout_secs = 5
"#
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).await.unwrap();
        assert_eq!(config.endpoint("local").unwrap(), "http://localhost:8545");
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_bad_file_is_a_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml = [").unwrap();

        let err = Config::load_or_default(Some(file.path())).await.unwrap_err();
        assert!(matches!(err, DemoError::Config(ref m) if m.contains("Failed to parse")));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Config::load_or_default(Some(&path)).await.unwrap_err();
        assert!(matches!(err, DemoError::Config(ref m) if m.contains("Failed to read")));
    }

    #[tokio::test]
    async fn test_no_file_uses_defaults() {
        let config = Config::load_or_default(None::<&Path>).await.unwrap();
        assert_eq!(config.default_network, "ethereum");
        assert_eq!(config.signing_network, "tenderly");
    }
}
