// Path: src/signer/external.rs
//! External signer: delegates signing to a custodial callback (§4.6, §9).
//!
//! The process never holds the identity secret in this mode. Only the
//! compiled, unsigned transaction bytes (plus blockhash and fee payer) are
//! handed to the callback; the encryption secret is never part of that
//! exchange, so a custodial holder of the identity key still cannot read
//! message traffic.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::address::Address;
use crate::error::{MessengerError, RpcError};
use crate::signer::{SignedTransaction, Signer, UnsignedTransaction};

/// A callback that signs a compiled transaction outside this process.
///
/// Receives `(unsigned_tx_bytes, blockhash, fee_payer)` and returns the
/// signed transaction bytes, or an error string on failure.
pub type SignCallback =
    Arc<dyn Fn(&[u8], &[u8; 32], &Address) -> BoxFuture<'static, Result<Vec<u8>, String>> + Send + Sync>;

/// Signs transactions via a delegated, out-of-process callback.
pub struct ExternalSigner {
    wallet_address: Address,
    callback: SignCallback,
}

impl ExternalSigner {
    /// Builds an external signer for `wallet_address`, delegating to `callback`.
    pub fn new(wallet_address: Address, callback: SignCallback) -> Self {
        Self { wallet_address, callback }
    }
}

#[async_trait]
impl Signer for ExternalSigner {
    fn fee_payer(&self) -> Address {
        self.wallet_address
    }

    async fn sign(&self, unsigned: &UnsignedTransaction) -> Result<SignedTransaction, MessengerError> {
        let message = unsigned.compile();
        let signed = (self.callback)(&message, &unsigned.blockhash, &unsigned.fee_payer)
            .await
            .map_err(RpcError::Transport)?;
        Ok(SignedTransaction(signed))
    }
}
