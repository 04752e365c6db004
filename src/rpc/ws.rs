// Path: src/rpc/ws.rs
//! Streaming log subscription over a WebSocket (§4.7, §4.8).
//!
//! The subscription is driven by a background task that owns the socket;
//! [`LogSubscription::unsubscribe`] aborts that task, guaranteeing no
//! further notifications are delivered once it returns (§4.8 step 6).

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use crate::address::Address;
use crate::error::RpcError;
use crate::rpc::{LogSubscription, LogsNotification};

/// Bounded so a slow consumer cannot grow the subscription's memory without limit.
const CHANNEL_CAPACITY: usize = 256;

/// Establishes a log subscription and returns a handle.
pub struct WsLogSubscriber;

impl WsLogSubscriber {
    /// Connects to `ws_url` and subscribes to logs mentioning `program_id`, commitment "confirmed".
    pub async fn connect(ws_url: &str, program_id: Address) -> Result<LogSubscription, RpcError> {
        let (stream, _response) = tokio_tungstenite::connect_async(ws_url)
            .await
            .map_err(|e| RpcError::Subscription(format!("WebSocket connect failed: {e}")))?;
        let (mut write, mut read) = stream.split();

        let subscribe_request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "logsSubscribe",
            "params": [
                {"mentions": [bs58::encode(program_id).into_string()]},
                {"commitment": "confirmed"},
            ],
        });
        write
            .send(Message::Text(subscribe_request.to_string()))
            .await
            .map_err(|e| RpcError::Subscription(format!("subscribe request failed: {e}")))?;

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                let message = match frame {
                    Ok(message) => message,
                    Err(e) => {
                        let _ = tx.send(Err(RpcError::Subscription(e.to_string()))).await;
                        break;
                    }
                };

                let Message::Text(text) = message else { continue };
                match parse_notification(&text) {
                    Some(Ok(notification)) => {
                        if tx.send(Ok(notification)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "dropping malformed log notification");
                    }
                    None => {}
                }
            }
            info!("log subscription stream ended");
        });

        let cancel = move || task.abort();
        Ok(LogSubscription::new(rx, cancel))
    }
}

fn parse_notification(text: &str) -> Option<Result<LogsNotification, String>> {
    let value: Value = serde_json::from_str(text).ok()?;
    if value.get("method")?.as_str()? != "logsNotification" {
        return None;
    }

    let result = value.get("params")?.get("result")?.get("value")?;
    let signature = result.get("signature")?.as_str()?.to_string();
    let logs = result
        .get("logs")?
        .as_array()?
        .iter()
        .filter_map(|l| l.as_str().map(str::to_string))
        .collect();
    let err = result.get("err").filter(|e| !e.is_null()).map(|e| e.to_string());

    Some(Ok(LogsNotification { signature, logs, err }))
}
