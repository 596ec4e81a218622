use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use stakenet_core::error::BootstrapError;
use stakenet_core::types::{Address, TxHash};
use tracing::trace;

use crate::types::{parse_data, parse_quantity, to_data, TxReceipt};

/// The slice of the Ethereum JSON-RPC surface the bootstrap consumes.
///
/// Transport problems (connection refused, timeout, malformed reply) are
/// `RpcFailure` and may be retried; an error object returned by the node is
/// `RpcRejected` and is not.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `eth_chainId`
    async fn chain_id(&self) -> Result<u64, BootstrapError>;

    /// `eth_call` against the latest block.
    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, BootstrapError>;

    /// `eth_getTransactionCount` including pending transactions.
    async fn transaction_count(&self, address: Address) -> Result<u64, BootstrapError>;

    /// `eth_sendRawTransaction`
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, BootstrapError>;

    /// `eth_getTransactionReceipt`; `None` until the transaction is mined.
    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, BootstrapError>;
}

#[derive(Debug, Clone)]
pub struct RpcConfig {
    pub url: String,
    /// Per-request timeout enforced by the HTTP client.
    pub timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// JSON-RPC 2.0 over HTTP POST.
pub struct HttpChainRpc {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpChainRpc {
    pub fn new(config: &RpcConfig) -> Result<Self, BootstrapError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BootstrapError::RpcFailure(format!("building HTTP client: {e}")))?;
        Ok(Self {
            url: config.url.clone(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call a JSON-RPC method and return the `result` field.
    async fn request(&self, method: &str, params: Value) -> Result<Value, BootstrapError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id
        });
        trace!(method, id, "rpc request");

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| BootstrapError::RpcFailure(format!("{method} via {}: {e}", self.url)))?;

        let json: Value = resp
            .json()
            .await
            .map_err(|e| BootstrapError::RpcFailure(format!("{method}: parsing response: {e}")))?;

        if let Some(err) = json.get("error") {
            return Err(BootstrapError::RpcRejected {
                method: method.to_string(),
                code: err["code"].as_i64().unwrap_or_default(),
                message: err["message"].as_str().unwrap_or_default().to_string(),
            });
        }

        Ok(json["result"].clone())
    }
}

#[async_trait]
impl ChainRpc for HttpChainRpc {
    async fn chain_id(&self) -> Result<u64, BootstrapError> {
        let result = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&result)
    }

    async fn call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>, BootstrapError> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to.to_checksum(), "data": to_data(data) }, "latest"]),
            )
            .await?;
        parse_data(&result)
    }

    async fn transaction_count(&self, address: Address) -> Result<u64, BootstrapError> {
        let result = self
            .request(
                "eth_getTransactionCount",
                json!([address.to_checksum(), "pending"]),
            )
            .await?;
        parse_quantity(&result)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, BootstrapError> {
        let result = self
            .request("eth_sendRawTransaction", json!([to_data(raw)]))
            .await?;
        let hash = result.as_str().ok_or_else(|| {
            BootstrapError::RpcFailure("eth_sendRawTransaction returned no hash".into())
        })?;
        TxHash::from_hex(hash)
    }

    async fn transaction_receipt(&self, hash: TxHash) -> Result<Option<TxReceipt>, BootstrapError> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash.to_hex()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        TxReceipt::from_json(&result).map(Some)
    }
}
