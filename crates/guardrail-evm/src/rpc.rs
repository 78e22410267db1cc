//! JSON-RPC backed `Simulator` and `Executor`.
//!
//! Both talk to a single node over HTTP using the standard `eth_*` methods:
//!
//! - simulation: `eth_estimateGas`, then `eth_call` for return data
//! - execution:  `eth_sendTransaction` from an unlocked node account
//!
//! Signing happens on the node. Neither adapter holds key material. Both
//! check `eth_chainId` against the requested chain before doing anything else.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        OnceLock,
    },
    time::Duration,
};

use alloy_primitives::{hex, Address, Bytes, B256};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use guardrail_contracts::{
    error::{GuardrailError, GuardrailResult},
    execution::ExecutionReceipt,
    plan::{ChainId, PlanStep, SimulationResult, TxRequest},
};
use guardrail_core::traits::{Executor, Simulator};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("http transport error: {0}")]
    Http(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed rpc response: {0}")]
    MalformedResponse(String),

    #[error("node is on chain {actual}, expected chain {expected}")]
    WrongChain { expected: ChainId, actual: ChainId },
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal JSON-RPC 2.0 client over HTTP.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    client: reqwest::Client,
    next_id: AtomicU64,
    chain_id: OnceLock<ChainId>,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, RpcError> {
        Self::with_timeout(url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::Http(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
            chain_id: OnceLock::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request and decode its `result` as `T`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!(url = %self.url, method, id, "rpc request");

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Http(e.to_string()))?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| RpcError::MalformedResponse(e.to_string()))?;

        parse_response(payload)
    }

    /// The node's chain id. Fetched once, then cached.
    pub async fn chain_id(&self) -> Result<ChainId, RpcError> {
        if let Some(chain_id) = self.chain_id.get() {
            return Ok(*chain_id);
        }
        let raw: String = self.request("eth_chainId", json!([])).await?;
        let chain_id = parse_hex_u64(&raw)?;
        Ok(*self.chain_id.get_or_init(|| chain_id))
    }

    /// Fail with `WrongChain` unless the node serves `expected`.
    pub async fn ensure_chain(&self, expected: ChainId) -> Result<(), RpcError> {
        check_chain(expected, self.chain_id().await?)
    }
}

fn check_chain(expected: ChainId, actual: ChainId) -> Result<(), RpcError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RpcError::WrongChain { expected, actual })
    }
}

fn parse_response<T: DeserializeOwned>(payload: Value) -> Result<T, RpcError> {
    let response: RpcResponse =
        serde_json::from_value(payload).map_err(|e| RpcError::MalformedResponse(e.to_string()))?;
    if let Some(error) = response.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
        });
    }
    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .map_err(|e| RpcError::MalformedResponse(e.to_string()))
}

/// Build the JSON transaction object shared by every `eth_*` call.
fn tx_object(tx: &TxRequest, from: Option<Address>, chain_id: Option<ChainId>) -> Value {
    let mut object = Map::new();
    if let Some(from) = from {
        object.insert("from".into(), json!(from.to_string()));
    }
    if let Some(chain_id) = chain_id {
        object.insert("chainId".into(), json!(format!("0x{chain_id:x}")));
    }
    object.insert("to".into(), json!(tx.to.to_string()));
    if let Some(data) = &tx.data {
        object.insert("data".into(), json!(hex::encode_prefixed(data)));
    }
    if let Some(value) = tx.value {
        object.insert("value".into(), json!(format!("0x{value:x}")));
    }
    Value::Object(object)
}

fn parse_hex_u64(raw: &str) -> Result<u64, RpcError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::MalformedResponse(format!("quantity '{raw}': {e}")))
}

/// `Simulator` that dry-runs steps on a live node.
#[derive(Debug)]
pub struct RpcSimulator {
    rpc: JsonRpcClient,
    from: Option<Address>,
}

impl RpcSimulator {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc, from: None }
    }

    /// Simulate as if sent by `from`. Needed when the call checks `msg.sender`.
    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    async fn try_simulate(&self, step: &PlanStep, chain_id: ChainId) -> Result<SimulationResult, RpcError> {
        self.rpc.ensure_chain(chain_id).await?;
        let tx = tx_object(&step.tx, self.from, None);
        let gas: String = self.rpc.request("eth_estimateGas", json!([tx])).await?;
        let gas_estimate = parse_hex_u64(&gas)?;
        let return_data: Bytes = self.rpc.request("eth_call", json!([tx, "latest"])).await?;
        Ok(SimulationResult::succeeded(gas_estimate, Some(return_data)))
    }
}

#[async_trait]
impl Simulator for RpcSimulator {
    async fn simulate_tx(&self, step: &PlanStep, chain_id: ChainId) -> SimulationResult {
        match self.try_simulate(step, chain_id).await {
            Ok(result) => result,
            Err(e) => {
                warn!(to = %step.tx.to, chain_id, error = %e, "simulation failed");
                SimulationResult::failed(e.to_string())
            }
        }
    }
}

/// `Executor` that submits steps with `eth_sendTransaction`.
///
/// When no sender is configured, the first account reported by
/// `eth_accounts` is used.
#[derive(Debug)]
pub struct RpcExecutor {
    rpc: JsonRpcClient,
    from: Option<Address>,
}

impl RpcExecutor {
    pub fn new(rpc: JsonRpcClient) -> Self {
        Self { rpc, from: None }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }

    async fn sender(&self) -> GuardrailResult<Address> {
        if let Some(from) = self.from {
            return Ok(from);
        }
        let accounts: Vec<Address> = self
            .rpc
            .request("eth_accounts", json!([]))
            .await
            .map_err(|e| GuardrailError::Submission {
                reason: format!("could not list node accounts: {e}"),
            })?;
        accounts.into_iter().next().ok_or_else(|| GuardrailError::Submission {
            reason: "no sender configured and the node reports no unlocked accounts".into(),
        })
    }
}

#[async_trait]
impl Executor for RpcExecutor {
    async fn execute_tx(&self, step: &PlanStep, chain_id: ChainId) -> GuardrailResult<ExecutionReceipt> {
        self.rpc
            .ensure_chain(chain_id)
            .await
            .map_err(|e| GuardrailError::Submission { reason: e.to_string() })?;
        let from = self.sender().await?;
        let tx = tx_object(&step.tx, Some(from), Some(chain_id));
        let tx_hash: B256 = self
            .rpc
            .request("eth_sendTransaction", json!([tx]))
            .await
            .map_err(|e| GuardrailError::Submission { reason: e.to_string() })?;

        info!(%tx_hash, %from, to = %step.tx.to, chain_id, "transaction submitted");
        Ok(ExecutionReceipt { tx_hash })
    }
}
