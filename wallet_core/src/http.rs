//! JSON-RPC wallet provider over HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::WalletError;
use crate::provider::WalletProvider;

/// HTTP client for a JSON-RPC endpoint whose node manages the accounts
/// (a local development chain, or a signing proxy).
///
/// Wraps `reqwest::Client` with the endpoint URL. Node-managed accounts are
/// pre-authorized, so when the node does not implement `eth_requestAccounts`
/// the request is answered with `eth_accounts`.
pub struct HttpProvider {
    http: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl HttpProvider {
    /// Create a provider targeting the given URL (e.g. `http://127.0.0.1:8545`).
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, WalletError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| WalletError::Transport(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        tracing::debug!(method, id, "wallet rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(WalletError::Transport(format!(
                "provider returned HTTP {}",
                response.status()
            )));
        }

        let reply: RpcResponse = response
            .json()
            .await
            .map_err(|e| WalletError::InvalidResponse(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(err) = reply.error {
            return Err(WalletError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        Ok(reply.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl WalletProvider for HttpProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError> {
        match self.rpc_call(method, params).await {
            Err(e) if method == "eth_requestAccounts" && e.is_method_not_found() => {
                tracing::debug!("eth_requestAccounts unsupported, using eth_accounts");
                self.rpc_call("eth_accounts", json!([])).await
            }
            other => other,
        }
    }

    fn name(&self) -> &str {
        "json-rpc"
    }
}
