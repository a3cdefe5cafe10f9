//! The wallet capability.
//!
//! A wallet is an opaque provider with one primitive, `request(method, params)`,
//! in the style of EIP-1193. [`WalletCapability`] layers typed calls for the
//! handful of methods the client needs on top of it.

use async_trait::async_trait;
use krypt_types::{Address, LedgerUnits, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::encoding::{
    parse_hex_data, parse_quantity, parse_quantity_u64, to_hex_data, to_quantity,
};
use crate::error::WalletError;

/// A wallet provider: accounts, authorization, and transaction signing.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Perform one request/response round trip.
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;
}

// ── Wire types ──────────────────────────────────────────────────────────

/// Parameters of `eth_sendTransaction`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireTransaction", into = "WireTransaction")]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    /// Gas limit hint.
    pub gas: Option<u64>,
    pub value: Option<LedgerUnits>,
    pub data: Option<Vec<u8>>,
}

impl TransactionRequest {
    /// A plain value transfer.
    pub fn transfer(from: Address, to: Address, value: LedgerUnits, gas: u64) -> Self {
        Self {
            from,
            to,
            gas: Some(gas),
            value: Some(value),
            data: None,
        }
    }

    /// A contract call carrying `data` and no value.
    pub fn contract_call(from: Address, contract: Address, data: Vec<u8>) -> Self {
        Self {
            from,
            to: contract,
            gas: None,
            value: None,
            data: Some(data),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct WireTransaction {
    from: Address,
    to: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<String>,
}

impl From<TransactionRequest> for WireTransaction {
    fn from(tx: TransactionRequest) -> Self {
        Self {
            from: tx.from,
            to: tx.to,
            gas: tx.gas.map(|g| to_quantity(u128::from(g))),
            value: tx.value.map(|v| to_quantity(v.raw())),
            data: tx.data.as_deref().map(to_hex_data),
        }
    }
}

impl TryFrom<WireTransaction> for TransactionRequest {
    type Error = String;

    fn try_from(wire: WireTransaction) -> Result<Self, Self::Error> {
        Ok(Self {
            from: wire.from,
            to: wire.to,
            gas: wire.gas.as_deref().map(parse_quantity_u64).transpose()?,
            value: wire
                .value
                .as_deref()
                .map(parse_quantity)
                .transpose()?
                .map(LedgerUnits::new),
            data: wire.data.as_deref().map(parse_hex_data).transpose()?,
        })
    }
}

/// Parameters of `eth_call`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireCall", into = "WireCall")]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Vec<u8>,
}

#[derive(Serialize, Deserialize)]
struct WireCall {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    from: Option<Address>,
    to: Address,
    data: String,
}

impl From<CallRequest> for WireCall {
    fn from(call: CallRequest) -> Self {
        Self {
            from: call.from,
            to: call.to,
            data: to_hex_data(&call.data),
        }
    }
}

impl TryFrom<WireCall> for CallRequest {
    type Error = String;

    fn try_from(wire: WireCall) -> Result<Self, Self::Error> {
        Ok(Self {
            from: wire.from,
            to: wire.to,
            data: parse_hex_data(&wire.data)?,
        })
    }
}

/// The subset of `eth_getTransactionReceipt` the client relies on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WireReceipt", into = "WireReceipt")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    pub block_number: u64,
    /// `false` when execution reverted.
    pub status: bool,
    pub gas_used: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReceipt {
    transaction_hash: TxHash,
    block_number: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    gas_used: Option<String>,
}

impl From<TransactionReceipt> for WireReceipt {
    fn from(r: TransactionReceipt) -> Self {
        Self {
            transaction_hash: r.transaction_hash,
            block_number: to_quantity(u128::from(r.block_number)),
            status: Some(if r.status { "0x1" } else { "0x0" }.to_string()),
            gas_used: Some(to_quantity(u128::from(r.gas_used))),
        }
    }
}

impl TryFrom<WireReceipt> for TransactionReceipt {
    type Error = String;

    fn try_from(wire: WireReceipt) -> Result<Self, Self::Error> {
        // Receipts without a status field predate status codes and did not revert.
        let status = match wire.status.as_deref() {
            Some(s) => parse_quantity(s)? == 1,
            None => true,
        };
        Ok(Self {
            transaction_hash: wire.transaction_hash,
            block_number: parse_quantity_u64(&wire.block_number)?,
            status,
            gas_used: wire
                .gas_used
                .as_deref()
                .map(parse_quantity_u64)
                .transpose()?
                .unwrap_or(0),
        })
    }
}

// ── WalletCapability ────────────────────────────────────────────────────

/// Typed access to a [`WalletProvider`].
#[derive(Clone)]
pub struct WalletCapability {
    provider: Arc<dyn WalletProvider>,
}

impl WalletCapability {
    pub fn new(provider: Arc<dyn WalletProvider>) -> Self {
        Self { provider }
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }

    /// Accounts already authorized for this client, without prompting.
    pub async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        let result = self.provider.request("eth_accounts", json!([])).await?;
        parse_accounts(result)
    }

    /// Ask the wallet to authorize accounts, prompting the user if needed.
    pub async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        let result = self
            .provider
            .request("eth_requestAccounts", json!([]))
            .await?;
        parse_accounts(result)
    }

    /// Sign and broadcast a transaction; returns its hash once accepted.
    pub async fn send_transaction(&self, tx: &TransactionRequest) -> Result<TxHash, WalletError> {
        let result = self
            .provider
            .request("eth_sendTransaction", json!([tx]))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse(format!("expected tx hash, got {result}")))?;
        TxHash::parse(raw).map_err(WalletError::InvalidResponse)
    }

    /// Execute a read-only call against the latest block.
    pub async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, WalletError> {
        let result = self
            .provider
            .request("eth_call", json!([call, "latest"]))
            .await?;
        let raw = result
            .as_str()
            .ok_or_else(|| WalletError::InvalidResponse(format!("expected call data, got {result}")))?;
        parse_hex_data(raw).map_err(WalletError::InvalidResponse)
    }

    /// Fetch a receipt; `None` while the transaction is not yet mined.
    pub async fn transaction_receipt(
        &self,
        hash: TxHash,
    ) -> Result<Option<TransactionReceipt>, WalletError> {
        let result = self
            .provider
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| WalletError::InvalidResponse(format!("invalid receipt: {e}")))
    }
}

impl fmt::Debug for WalletCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCapability")
            .field("provider", &self.provider.name())
            .finish()
    }
}

fn parse_accounts(result: Value) -> Result<Vec<Address>, WalletError> {
    let entries: Vec<String> = serde_json::from_value(result)
        .map_err(|e| WalletError::InvalidResponse(format!("invalid account list: {e}")))?;
    entries
        .iter()
        .map(|raw| {
            Address::parse(raw).map_err(|e| WalletError::InvalidResponse(e.to_string()))
        })
        .collect()
}
