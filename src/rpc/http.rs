// Path: src/rpc/http.rs
//! HTTP JSON-RPC implementation of [`RpcGateway`] (§4.7).

use async_trait::async_trait;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::address::Address;
use crate::error::RpcError;
use crate::rpc::{
    AccountInfo, GetSignaturesOptions, LogSubscription, RpcGateway, SignatureInfo,
    SignatureStatus, TransactionView,
};
use crate::rpc::ws::WsLogSubscriber;

/// A JSON-RPC client over a single HTTP endpoint.
///
/// The WebSocket client used by `subscribe_logs` is created lazily, the
/// first time it is called, per §5's "shared resources" guidance.
pub struct HttpRpcClient {
    rpc_url: String,
    ws_url: String,
    http: reqwest::Client,
    request_id: std::sync::atomic::AtomicU64,
}

impl HttpRpcClient {
    /// Builds a client against `rpc_url`, deriving the WS URL unless `ws_url_override` is set.
    pub fn new(rpc_url: String, ws_url_override: Option<String>) -> Result<Self, RpcError> {
        let ws_url = match ws_url_override {
            Some(url) => url,
            None => crate::rpc::default_ws_url(&rpc_url)
                .map_err(|e| RpcError::Transport(format!("invalid rpc_url: {e}")))?,
        };
        Ok(Self {
            rpc_url,
            ws_url,
            http: reqwest::Client::new(),
            request_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.request_id.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method, "submitting RPC call");
        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| RpcError::MalformedResponse(e.to_string()))?;

        if let Some(error) = envelope.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            warn!(method, code, %message, "RPC call returned an error");
            return Err(RpcError::Remote { code, message });
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::MalformedResponse("response missing `result`".into()))
    }
}

fn to_base58(address: Address) -> String {
    bs58::encode(address).into_string()
}

#[async_trait]
impl RpcGateway for HttpRpcClient {
    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcError> {
        let result = self.call("getLatestBlockhash", json!([{"commitment": "confirmed"}])).await?;
        let blockhash = result
            .get("value")
            .and_then(|v| v.get("blockhash"))
            .ok_or_else(|| RpcError::MalformedResponse("missing value.blockhash".into()))?;
        let encoded = blockhash
            .as_str()
            .ok_or_else(|| RpcError::MalformedResponse("blockhash is not a string".into()))?;
        let decoded = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| RpcError::MalformedResponse(format!("invalid base58 blockhash: {e}")))?;
        decoded
            .try_into()
            .map_err(|_| RpcError::MalformedResponse("blockhash has the wrong length".into()))
    }

    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, RpcError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(signed_tx);
        let result = self
            .call("sendTransaction", json!([encoded, {"encoding": "base64"}]))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::MalformedResponse("sendTransaction result is not a string".into()))
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, RpcError> {
        let result = self
            .call(
                "getSignatureStatuses",
                json!([signatures, {"searchTransactionHistory": true}]),
            )
            .await?;
        let entries = result
            .get("value")
            .and_then(Value::as_array)
            .ok_or_else(|| RpcError::MalformedResponse("missing value array".into()))?;

        entries
            .iter()
            .map(|entry| {
                if entry.is_null() {
                    return Ok(None);
                }
                let status = entry.get("confirmationStatus").and_then(Value::as_str).unwrap_or("");
                let err = entry.get("err").filter(|e| !e.is_null()).map(|e| e.to_string());
                Ok(Some(SignatureStatus {
                    confirmed: status == "confirmed" || status == "finalized",
                    finalized: status == "finalized",
                    err,
                }))
            })
            .collect()
    }

    async fn get_signatures_for_address(
        &self,
        address: Address,
        options: GetSignaturesOptions,
    ) -> Result<Vec<SignatureInfo>, RpcError> {
        let mut config = serde_json::Map::new();
        config.insert("limit".into(), json!(options.limit));
        if let Some(before) = options.before {
            config.insert("before".into(), json!(before));
        }

        let result = self
            .call("getSignaturesForAddress", json!([to_base58(address), config]))
            .await?;
        let entries = result
            .as_array()
            .ok_or_else(|| RpcError::MalformedResponse("expected an array of signatures".into()))?;

        entries
            .iter()
            .map(|entry| {
                let signature = entry
                    .get("signature")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RpcError::MalformedResponse("missing signature".into()))?
                    .to_string();
                let block_time = entry.get("blockTime").and_then(Value::as_i64);
                let err = entry.get("err").filter(|e| !e.is_null()).map(|e| e.to_string());
                Ok(SignatureInfo { signature, block_time, err })
            })
            .collect()
    }

    async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionView>, RpcError> {
        let result = self
            .call(
                "getTransaction",
                json!([signature, {"encoding": "json", "maxSupportedTransactionVersion": 0}]),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let log_messages = result
            .get("meta")
            .and_then(|m| m.get("logMessages"))
            .and_then(Value::as_array)
            .map(|lines| lines.iter().filter_map(|l| l.as_str().map(str::to_string)).collect())
            .unwrap_or_default();
        let block_time = result.get("blockTime").and_then(Value::as_i64);

        Ok(Some(TransactionView { log_messages, block_time }))
    }

    async fn get_account_info(&self, address: Address) -> Result<Option<AccountInfo>, RpcError> {
        let result = self
            .call("getAccountInfo", json!([to_base58(address), {"encoding": "base64"}]))
            .await?;
        let value = result.get("value").cloned().unwrap_or(Value::Null);
        if value.is_null() {
            return Ok(None);
        }

        let data_field = value
            .get("data")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::MalformedResponse("missing account data".into()))?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(data_field)
            .map_err(|e| RpcError::MalformedResponse(format!("invalid base64 account data: {e}")))?;

        Ok(Some(AccountInfo { data }))
    }

    async fn subscribe_logs(&self, program_id: Address) -> Result<LogSubscription, RpcError> {
        WsLogSubscriber::connect(&self.ws_url, program_id).await
    }
}
