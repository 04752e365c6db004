// Path: src/rpc/mod.rs
//! RPC gateway (§4.7): a thin adapter over the host chain's JSON-RPC surface.
//!
//! [`RpcGateway`] is the trait the messenger core depends on; [`http`]
//! implements it over plain JSON-RPC via `reqwest`, and [`ws`] implements
//! the streaming log subscription over a WebSocket. Tests use an in-memory
//! fake instead of either.

pub mod http;
pub mod ws;

use async_trait::async_trait;

use crate::address::Address;
use crate::error::RpcError;

/// The confirmation status of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureStatus {
    /// `true` once the cluster has reached at least "confirmed" commitment.
    pub confirmed: bool,
    /// `true` once the cluster has reached "finalized" commitment.
    pub finalized: bool,
    /// A program-level error string, if the transaction landed but failed.
    pub err: Option<String>,
}

impl SignatureStatus {
    /// Whether this status satisfies the confirmation policy (§4.6): confirmed or finalized.
    pub fn is_accepted(&self) -> bool {
        self.err.is_none() && (self.confirmed || self.finalized)
    }
}

/// One entry from `get_signatures_for_address`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    /// The transaction signature.
    pub signature: String,
    /// The block's unix timestamp, if known.
    pub block_time: Option<i64>,
    /// A program-level error string, if the transaction failed.
    pub err: Option<String>,
}

/// Pagination options for `get_signatures_for_address` (§4.8 read step 1).
#[derive(Debug, Clone, Default)]
pub struct GetSignaturesOptions {
    /// Only return signatures older than this one (pagination cursor).
    pub before: Option<String>,
    /// Maximum number of signatures to return in this page.
    pub limit: usize,
}

/// The subset of a fetched transaction this client needs: its log lines and block time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionView {
    /// Log lines emitted during execution, in order.
    pub log_messages: Vec<String>,
    /// The block's unix timestamp, if known.
    pub block_time: Option<i64>,
}

/// Raw account data as returned by `get_account_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// The account's raw data bytes.
    pub data: Vec<u8>,
}

/// A single notification from a log subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogsNotification {
    /// The signature of the transaction that produced these logs.
    pub signature: String,
    /// Log lines emitted during execution, in order.
    pub logs: Vec<String>,
    /// A program-level error string, if the transaction failed.
    pub err: Option<String>,
}

/// A live handle to a log subscription.
///
/// Dropping this without calling [`LogSubscription::unsubscribe`] also
/// terminates the subscription (the background task holds the receiving
/// half's counterpart and exits once the channel closes), but calling it
/// explicitly guarantees no further notifications are delivered once the
/// call returns, per §4.8 step 6.
pub struct LogSubscription {
    receiver: tokio::sync::mpsc::Receiver<Result<LogsNotification, RpcError>>,
    cancel: Box<dyn FnOnce() + Send>,
}

impl LogSubscription {
    /// Builds a subscription handle from its receiving channel and a cancel hook.
    pub fn new(
        receiver: tokio::sync::mpsc::Receiver<Result<LogsNotification, RpcError>>,
        cancel: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self { receiver, cancel: Box::new(cancel) }
    }

    /// Awaits the next notification, or `None` once the subscription has ended.
    pub async fn next(&mut self) -> Option<Result<LogsNotification, RpcError>> {
        self.receiver.recv().await
    }

    /// Cancels the subscription. No further notifications are delivered after this returns.
    pub fn unsubscribe(self) {
        (self.cancel)();
    }
}

/// The operations the messenger core needs from the host chain (§4.7).
#[async_trait]
pub trait RpcGateway: Send + Sync {
    /// Fetches a recent blockhash to anchor a new transaction.
    async fn get_latest_blockhash(&self) -> Result<[u8; 32], RpcError>;

    /// Submits a signed transaction, returning its signature.
    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, RpcError>;

    /// Fetches the confirmation status of each signature, in order; `None` for unknown signatures.
    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, RpcError>;

    /// Lists signatures that touched `address`, most recent first.
    async fn get_signatures_for_address(
        &self,
        address: Address,
        options: GetSignaturesOptions,
    ) -> Result<Vec<SignatureInfo>, RpcError>;

    /// Fetches a transaction's log messages and block time by signature.
    async fn get_transaction(&self, signature: &str) -> Result<Option<TransactionView>, RpcError>;

    /// Fetches raw account data; `None` if the account does not exist.
    async fn get_account_info(&self, address: Address) -> Result<Option<AccountInfo>, RpcError>;

    /// Opens a streaming log subscription mentioning `program_id`.
    async fn subscribe_logs(&self, program_id: Address) -> Result<LogSubscription, RpcError>;
}

/// Derives the default WebSocket URL from an HTTP RPC URL (§4.7): `https`
/// becomes `wss`, `http` becomes `ws`, everything else is left untouched.
pub fn default_ws_url(rpc_url: &str) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(rpc_url)?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => other,
    };
    url.set_scheme(scheme).ok();
    Ok(url.to_string())
}
