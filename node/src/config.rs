//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use krypt_ledger::{LedgerContract, LedgerInterface};
use krypt_types::Address;
use krypt_utils::LogFormat;

use crate::NodeError;

/// Configuration for a Krypt client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC endpoint of the wallet provider. Absent means no wallet
    /// capability is available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    /// Address of the ledger contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,

    /// Optional JSON ABI descriptor for the ledger contract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abi_path: Option<PathBuf>,

    /// Gas limit sent with the native value transfer.
    #[serde(default = "default_gas_limit_hint")]
    pub gas_limit_hint: u64,

    /// Bounded wait for a ledger write to be mined.
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_receipt_poll_interval_ms")]
    pub receipt_poll_interval_ms: u64,

    /// Per-request timeout for the wallet provider.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where the last-known transaction count is kept.
    #[serde(default = "default_hint_file")]
    pub hint_file: PathBuf,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_gas_limit_hint() -> u64 {
    21_000
}

fn default_confirmation_timeout_secs() -> u64 {
    120
}

fn default_receipt_poll_interval_ms() -> u64 {
    1_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_hint_file() -> PathBuf {
    PathBuf::from("./krypt_hint.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the ledger contract: its address plus the interface, checked
    /// against `abi_path` when one is configured.
    pub fn ledger_contract(&self) -> Result<LedgerContract, NodeError> {
        let address = self
            .contract_address
            .ok_or_else(|| NodeError::Config("contract_address is required".to_string()))?;

        let interface = match &self.abi_path {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                LedgerInterface::from_abi_json(&json)?
            }
            None => LedgerInterface::default(),
        };
        Ok(LedgerContract::new(address, interface))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            contract_address: None,
            abi_path: None,
            gas_limit_hint: default_gas_limit_hint(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            receipt_poll_interval_ms: default_receipt_poll_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            hint_file: default_hint_file(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTRACT: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ClientConfig {
            rpc_url: Some("http://127.0.0.1:8545".into()),
            contract_address: Some(Address::parse(CONTRACT).unwrap()),
            ..ClientConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.rpc_url, config.rpc_url);
        assert_eq!(parsed.contract_address, config.contract_address);
        assert_eq!(parsed.gas_limit_hint, config.gas_limit_hint);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_url, None);
        assert_eq!(config.gas_limit_hint, 21_000);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(120));
        assert_eq!(config.receipt_poll_interval(), Duration::from_secs(1));
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.hint_file, PathBuf::from("./krypt_hint.json"));
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = format!(
            r#"
            contract_address = "{CONTRACT}"
            confirmation_timeout_secs = 30
            log_format = "json"
        "#
        );
        let config = ClientConfig::from_toml_str(&toml).expect("should parse");
        assert_eq!(config.confirmation_timeout_secs, 30);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.log_level, "info"); // default
        assert_eq!(config.ledger_contract().unwrap().address.to_string(), CONTRACT);
    }

    #[test]
    fn malformed_contract_address_is_config_error() {
        let err = ClientConfig::from_toml_str(r#"contract_address = "0x1234""#).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn missing_contract_is_config_error() {
        assert!(matches!(
            ClientConfig::default().ledger_contract(),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn bad_abi_file_is_interface_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abi.json");
        std::fs::write(&path, "[]").unwrap();
        let config = ClientConfig {
            contract_address: Some(Address::parse(CONTRACT).unwrap()),
            abi_path: Some(path),
            ..ClientConfig::default()
        };
        assert!(matches!(
            config.ledger_contract(),
            Err(NodeError::Interface(_))
        ));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = ClientConfig::from_toml_file("/nonexistent/krypt.toml");
        assert!(matches!(result, Err(NodeError::Config(_))));
    }
}
