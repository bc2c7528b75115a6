//! JSON-RPC node adapter.
//!
//! [`RpcClient`] implements [`ContractClient`] and [`WalletSession`] against
//! an Ethereum-compatible node over HTTP:
//!
//! - writes: `eth_sendTransaction` (the node's unlocked account signs)
//! - reads: `eth_call` at `latest`
//! - receipts: `eth_getTransactionReceipt` (`null` means not yet mined)
//! - session: `eth_chainId` must match the configured chain before
//!   `eth_accounts` is consulted
//!
//! JSON-RPC error code 4001 is the wallet's "user rejected" signal and maps
//! to [`ClientError::WalletRejected`]; everything else is a plain RPC error.
//! The endpoint URL can embed an API key, so it is never logged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use rdx_execution::abi::{decode_output, AbiValue};
use rdx_execution::{ClientError, Connector, ContractCall, ContractClient, ReceiptStatus, WalletSession};
use rdx_schemas::{Address, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const NODE_CONNECTOR_ID: &str = "node";

/// EIP-1193 "user rejected request".
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug)]
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    chain_id: u64,
    next_id: AtomicU64,
    account: Mutex<Option<Address>>,
}

impl RpcClient {
    pub fn new(url: String, chain_id: u64) -> Self {
        Self {
            http: reqwest::Client::new(),
            url,
            chain_id,
            next_id: AtomicU64::new(1),
            account: Mutex::new(None),
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn account_slot(&self) -> MutexGuard<'_, Option<Address>> {
        self.account.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// One JSON-RPC round trip. Transport and framing problems come back as
    /// `ClientError::Rpc`; a JSON-RPC error object is mapped by code.
    async fn call(&self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(method, id, "rpc request");
        let resp = self
            .post(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .await
            .map_err(|e| ClientError::Rpc(format!("{e:#}")))?;

        if let Some(err) = resp.error {
            tracing::debug!(method, id, code = err.code, "rpc error");
            return Err(if err.code == USER_REJECTED_CODE {
                ClientError::WalletRejected(err.message)
            } else {
                ClientError::Rpc(format!("{} (code {})", err.message, err.code))
            });
        }
        Ok(resp.result.unwrap_or(Value::Null))
    }

    async fn post(&self, req: &RpcRequest<'_>) -> anyhow::Result<RpcResponse> {
        let resp = self
            .http
            .post(&self.url)
            .json(req)
            .send()
            .await
            .with_context(|| format!("{} request failed", req.method))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("{} http error status={}", req.method, status.as_u16()));
        }
        resp.json::<RpcResponse>()
            .await
            .with_context(|| format!("{} response json decode failed", req.method))
    }

    async fn node_chain_id(&self) -> Result<u64, ClientError> {
        let v = self.call("eth_chainId", json!([])).await?;
        let s = v
            .as_str()
            .ok_or_else(|| ClientError::Decode(format!("eth_chainId returned {v}")))?;
        parse_quantity(s)
    }
}

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReceiptBody {
    status: Option<String>,
}

fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn from_hex(s: &str) -> Result<Vec<u8>, ClientError> {
    let body = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(body).map_err(|e| ClientError::Decode(format!("bad hex data: {e}")))
}

/// `0x`-prefixed hex quantity, as used for chain ids and status codes.
fn parse_quantity(s: &str) -> Result<u64, ClientError> {
    let body = s
        .strip_prefix("0x")
        .ok_or_else(|| ClientError::Decode(format!("quantity '{s}' lacks 0x prefix")))?;
    u64::from_str_radix(body, 16).map_err(|_| ClientError::Decode(format!("bad quantity '{s}'")))
}

fn expect_str<'a>(method: &str, v: &'a Value) -> Result<&'a str, ClientError> {
    v.as_str()
        .ok_or_else(|| ClientError::Decode(format!("{method} returned {v}")))
}

#[async_trait]
impl ContractClient for RpcClient {
    async fn write(&self, from: Address, call: &ContractCall) -> Result<TxHash, ClientError> {
        let data = call
            .calldata()
            .map_err(|e| ClientError::Rpc(format!("invalid calldata: {e}")))?;
        let tx = json!({
            "from": from.to_string(),
            "to": call.to.to_string(),
            "data": to_hex(&data),
        });
        let v = self.call("eth_sendTransaction", json!([tx])).await?;
        let s = expect_str("eth_sendTransaction", &v)?;
        TxHash::from_hex(s).map_err(|e| ClientError::Decode(format!("tx hash '{s}': {e}")))
    }

    async fn read(&self, call: &ContractCall) -> Result<Vec<AbiValue>, ClientError> {
        let data = call
            .calldata()
            .map_err(|e| ClientError::Rpc(format!("invalid calldata: {e}")))?;
        let req = json!({
            "to": call.to.to_string(),
            "data": to_hex(&data),
        });
        let v = self.call("eth_call", json!([req, "latest"])).await?;
        let out = from_hex(expect_str("eth_call", &v)?)?;
        Ok(decode_output(call.function, &out)?)
    }

    async fn receipt(&self, hash: TxHash) -> Result<ReceiptStatus, ClientError> {
        let v = self
            .call("eth_getTransactionReceipt", json!([hash.to_string()]))
            .await?;
        if v.is_null() {
            return Ok(ReceiptStatus::Pending);
        }
        let body: ReceiptBody = serde_json::from_value(v)
            .map_err(|e| ClientError::Decode(format!("receipt: {e}")))?;
        match body.status.as_deref().map(parse_quantity).transpose()? {
            Some(1) => Ok(ReceiptStatus::Success),
            Some(0) => Ok(ReceiptStatus::Reverted),
            other => Err(ClientError::Decode(format!("receipt status {other:?}"))),
        }
    }
}

#[async_trait]
impl WalletSession for RpcClient {
    fn account(&self) -> Option<Address> {
        *self.account_slot()
    }

    fn connectors(&self) -> Vec<Connector> {
        vec![Connector {
            id: NODE_CONNECTOR_ID.to_string(),
            name: "Node accounts".to_string(),
        }]
    }

    async fn connect(&self, connector_id: &str) -> Result<Address, ClientError> {
        if connector_id != NODE_CONNECTOR_ID {
            return Err(ClientError::Rpc(format!("unknown connector '{connector_id}'")));
        }
        let reported = self.node_chain_id().await?;
        if reported != self.chain_id {
            return Err(ClientError::Rpc(format!(
                "chain id mismatch: node reports {reported}, expected {}",
                self.chain_id
            )));
        }

        let v = self.call("eth_accounts", json!([])).await?;
        let first = v
            .as_array()
            .and_then(|a| a.first())
            .and_then(Value::as_str)
            .ok_or(ClientError::NotConnected)?;
        let account = Address::from_hex(first)
            .map_err(|e| ClientError::Decode(format!("account '{first}': {e}")))?;

        *self.account_slot() = Some(account);
        tracing::info!(account = %account.short(), chain_id = reported, "wallet connected");
        Ok(account)
    }

    async fn disconnect(&self) {
        *self.account_slot() = None;
    }
}
