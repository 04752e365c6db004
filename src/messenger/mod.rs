// Path: src/messenger/mod.rs
//! Messenger core (§4.8): orchestrates init/register/update/deregister, send, read, and listen.

pub mod reassembly;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ed25519_dalek::{SigningKey, VerifyingKey};
use futures_util::stream::{self, StreamExt};
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::address::{derive_registry_address, Address};
use crate::config::{MessengerConfig, SigningMode};
use crate::crypto;
use crate::error::{MessengerError, RpcError};
use crate::frame::{self, Frame};
use crate::keystore::{self, LoadedKeys};
use crate::rpc::{GetSignaturesOptions, RpcGateway};
use crate::signer::external::ExternalSigner;
use crate::signer::local::LocalSigner;
use crate::signer::{Signer, UnsignedTransaction};
use crate::types::{IdentityKey, Message, ReadOptions};
use crate::wire::event::{self, MessageSentEvent};
use crate::wire::instructions::{self, FeeAccounts};
use crate::wire::registry;

use reassembly::ReassemblyBuffer;

/// How many distinct signatures are fetched and parsed concurrently during `read` (§5, §9).
const HISTORY_FETCH_CONCURRENCY: usize = 20;
/// Headroom multiplier for pagination: collect up to `10 * limit` candidate signatures.
const HISTORY_HEADROOM_FACTOR: usize = 10;
/// Page size for each `get_signatures_for_address` call.
const SIGNATURES_PAGE_SIZE: usize = 1000;
/// Confirmation polling budget (§4.6, §5): 30 polls at ~1s each.
const CONFIRMATION_POLL_ATTEMPTS: u32 = 30;
const CONFIRMATION_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(1);

struct EncryptionKeys {
    public: VerifyingKey,
    secret: SigningKey,
}

/// The client library's entry point: one per local identity.
pub struct Messenger {
    rpc: Arc<dyn RpcGateway>,
    signer: Arc<dyn Signer>,
    program_id: Address,
    keys_dir: std::path::PathBuf,
    fee_accounts: Option<FeeAccounts>,
    /// Only `Some` in local-signer mode, where the identity secret doubles as an encryption secret (§4.1).
    identity_secret_for_crypto: Option<SigningKey>,
    encryption: Arc<RwLock<Option<EncryptionKeys>>>,
    initialized: Arc<AtomicBool>,
}

/// Cancels a live `listen` subscription (§4.8 step 6).
pub struct ListenHandle {
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ListenHandle {
    /// Cancels the subscription. No further callbacks fire after this returns.
    pub async fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        let _ = self.task.await;
    }
}

impl Messenger {
    /// Builds a messenger from a validated configuration. Does not touch the network.
    pub fn new(config: MessengerConfig, rpc: Arc<dyn RpcGateway>) -> Self {
        let (signer, identity_secret_for_crypto): (Arc<dyn Signer>, Option<SigningKey>) =
            match config.signing_mode {
                SigningMode::Local(secret) => {
                    let crypto_secret = secret.clone();
                    (Arc::new(LocalSigner::new(secret)), Some(crypto_secret))
                }
                SigningMode::External { wallet_address, callback } => {
                    (Arc::new(ExternalSigner::new(wallet_address, callback)), None)
                }
            };

        Self {
            rpc,
            signer,
            program_id: config.program_id,
            keys_dir: config.keys_dir,
            fee_accounts: config.fee_accounts,
            identity_secret_for_crypto,
            encryption: Arc::new(RwLock::new(None)),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    /// This messenger's identity address.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey(self.signer.fee_payer())
    }

    fn registry_address(&self) -> Address {
        derive_registry_address(&self.signer.fee_payer(), &self.program_id)
    }

    /// Resolves the identity address, loads or generates the local encryption
    /// key, and reconciles it with the on-chain registry (§4.8 `init`).
    ///
    /// Idempotent: calling this twice with the same on-disk key file and
    /// on-chain state performs at most one write across both calls.
    pub async fn init(&self) -> Result<(Address, bool), MessengerError> {
        let identity = self.signer.fee_payer();
        let identity_b58 = bs58::encode(identity).into_string();

        let LoadedKeys { public, secret, .. } = keystore::load_or_generate(&identity_b58, &self.keys_dir)?;
        let registry_pda = self.registry_address();

        let existing = self.rpc.get_account_info(registry_pda).await?;
        let wrote = match existing {
            Some(account) => {
                let parsed = registry::parse_registry_account(&account.data)?;
                if parsed.encryption_key == public.to_bytes() {
                    debug!(identity = %identity_b58, "on-chain encryption key already matches local key");
                    false
                } else {
                    info!(identity = %identity_b58, "on-chain encryption key differs, updating");
                    self.update_encryption_key_onchain(registry_pda, public).await?;
                    true
                }
            }
            None => {
                info!(identity = %identity_b58, "no registry entry found, registering");
                self.register_onchain(registry_pda, public).await?;
                true
            }
        };

        *self.encryption.write().await = Some(EncryptionKeys { public, secret });
        self.initialized.store(true, Ordering::SeqCst);

        Ok((registry_pda, wrote))
    }

    async fn register_onchain(&self, registry_pda: Address, encryption_public: VerifyingKey) -> Result<String, MessengerError> {
        let system_program = [0u8; 32];
        let ix = instructions::register(
            self.program_id,
            registry_pda,
            self.signer.fee_payer(),
            system_program,
            encryption_public.to_bytes(),
        );
        self.submit_and_confirm(vec![ix]).await
    }

    /// Rotates the published encryption key (§4.8 `update`).
    pub async fn update(&self, new_key: VerifyingKey) -> Result<String, MessengerError> {
        let registry_pda = self.registry_address();
        self.update_encryption_key_onchain(registry_pda, new_key).await
    }

    async fn update_encryption_key_onchain(
        &self,
        registry_pda: Address,
        new_key: VerifyingKey,
    ) -> Result<String, MessengerError> {
        let ix = instructions::update_encryption_key(
            self.program_id,
            registry_pda,
            self.signer.fee_payer(),
            new_key.to_bytes(),
        );
        self.submit_and_confirm(vec![ix]).await
    }

    /// Closes the registry entry (§4.8 `deregister`).
    pub async fn deregister(&self) -> Result<String, MessengerError> {
        let ix = instructions::deregister(self.program_id, self.registry_address(), self.signer.fee_payer());
        self.submit_and_confirm(vec![ix]).await
    }

    /// Looks up `identity`'s published encryption key, base58-encoded.
    ///
    /// Absence (no registry entry, or any RPC error) is reported as `None`
    /// rather than an error, since lookups must be cheap and non-throwing (§7).
    pub async fn lookup_encryption_key(&self, identity: IdentityKey) -> Option<String> {
        self.lookup_encryption_key_raw(identity.0).await.map(|key| bs58::encode(key).into_string())
    }

    async fn lookup_encryption_key_raw(&self, identity: Address) -> Option<Address> {
        let registry_pda = derive_registry_address(&identity, &self.program_id);
        let account = self.rpc.get_account_info(registry_pda).await.ok().flatten()?;
        let parsed = registry::parse_registry_account(&account.data).ok()?;
        Some(parsed.encryption_key)
    }

    /// Encrypts, frames, and submits `text` to `recipient` (§4.8 `send`).
    ///
    /// Returns one signature per chunk, in chunk order. A per-chunk failure
    /// aborts the remainder and surfaces the signatures already landed.
    pub async fn send(
        &self,
        recipient: IdentityKey,
        text: &str,
        explicit_encryption_key: Option<VerifyingKey>,
    ) -> Result<Vec<String>, MessengerError> {
        let recipient_key = self.resolve_recipient_key(recipient, explicit_encryption_key).await?;
        let sender_secret = self.send_side_secret().await?;

        let frames = frame::encode(text);
        let total = frames.len();
        let mut signatures = Vec::with_capacity(total);

        for (index, f) in frames.into_iter().enumerate() {
            match self.send_one_frame(recipient, &f, &recipient_key, &sender_secret).await {
                Ok(sig) => signatures.push(sig),
                Err(e) => {
                    return Err(MessengerError::PartialSend {
                        landed: signatures,
                        failed_index: index,
                        total,
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(signatures)
    }

    async fn resolve_recipient_key(
        &self,
        recipient: IdentityKey,
        explicit_encryption_key: Option<VerifyingKey>,
    ) -> Result<VerifyingKey, MessengerError> {
        if let Some(key) = explicit_encryption_key {
            return Ok(key);
        }
        if let Some(registered) = self.lookup_encryption_key_raw(recipient.0).await {
            if let Ok(key) = VerifyingKey::from_bytes(&registered) {
                return Ok(key);
            }
        }
        VerifyingKey::from_bytes(&recipient.0)
            .map_err(|e| crate::error::CryptoError::InvalidKey(e.to_string()).into())
    }

    async fn send_side_secret(&self) -> Result<SigningKey, MessengerError> {
        if let Some(secret) = &self.identity_secret_for_crypto {
            return Ok(secret.clone());
        }
        match self.encryption.read().await.as_ref() {
            Some(keys) => Ok(keys.secret.clone()),
            None => Err(MessengerError::NotInitialized),
        }
    }

    async fn send_one_frame(
        &self,
        recipient: IdentityKey,
        f: &Frame,
        recipient_key: &VerifyingKey,
        sender_secret: &SigningKey,
    ) -> Result<String, MessengerError> {
        let (ciphertext, nonce) = crypto::encrypt(&f.to_bytes(), sender_secret, recipient_key)?;
        let ix = instructions::send_message(
            self.program_id,
            self.signer.fee_payer(),
            recipient.0,
            &ciphertext,
            &nonce,
            self.fee_accounts,
        );
        self.submit_and_confirm(vec![ix]).await
    }

    async fn submit_and_confirm(&self, instructions: Vec<crate::wire::Instruction>) -> Result<String, MessengerError> {
        let blockhash = self.rpc.get_latest_blockhash().await?;
        let unsigned = UnsignedTransaction { blockhash, fee_payer: self.signer.fee_payer(), instructions };
        let signed = self.signer.sign(&unsigned).await?;
        let signature = self.rpc.send_transaction(&signed.0).await?;
        self.poll_confirmation(&signature).await?;
        Ok(signature)
    }

    async fn poll_confirmation(&self, signature: &str) -> Result<(), MessengerError> {
        for _ in 0..CONFIRMATION_POLL_ATTEMPTS {
            let statuses = self.rpc.get_signature_statuses(std::slice::from_ref(&signature.to_string())).await?;
            if let Some(Some(status)) = statuses.into_iter().next() {
                if status.is_accepted() {
                    return Ok(());
                }
            }
            tokio::time::sleep(CONFIRMATION_POLL_INTERVAL).await;
        }
        Err(MessengerError::ConfirmationTimeout { signature: signature.to_string() })
    }

    /// Back-fills historical messages addressed to this identity (§4.8 `read`).
    pub async fn read(&self, options: ReadOptions) -> Result<Vec<Message>, MessengerError> {
        let identity = self.signer.fee_payer();
        let limit = if options.limit == 0 { usize::MAX } else { options.limit };
        let collect_cap = limit.saturating_mul(HISTORY_HEADROOM_FACTOR);

        let signatures = self.collect_signatures(collect_cap, options.since).await?;

        let encryption_secret = self.encryption.read().await.as_ref().map(|k| k.secret.clone());
        let identity_secret = self.identity_secret_for_crypto.clone();
        let buffer = ReassemblyBuffer::new();
        let mut matched = 0usize;
        let mut finished = Vec::new();

        let mut fetches = stream::iter(signatures.into_iter().map(|sig| {
            let rpc = Arc::clone(&self.rpc);
            async move {
                let tx = rpc.get_transaction(&sig.signature).await;
                (sig, tx)
            }
        }))
        .buffer_unordered(HISTORY_FETCH_CONCURRENCY);

        while let Some((sig_info, tx_result)) = fetches.next().await {
            if matched >= limit {
                break;
            }
            let tx = match tx_result {
                Ok(Some(tx)) => tx,
                Ok(None) => continue,
                Err(e) => {
                    warn!(signature = %sig_info.signature, error = %e, "failed to fetch transaction, skipping");
                    continue;
                }
            };

            for event in event::parse_events(&tx.log_messages) {
                if event.recipient != identity {
                    continue;
                }
                matched += 1;

                let Some(plaintext) =
                    decrypt_event(&event, encryption_secret.as_ref(), identity_secret.as_ref())
                else {
                    continue;
                };
                let Ok(decoded) = frame::decode(&plaintext) else { continue };

                if let Some(message) = buffer.ingest(
                    event.sender,
                    event.recipient,
                    decoded,
                    sig_info.signature.clone(),
                    event.timestamp,
                ) {
                    finished.push(message);
                }
            }
        }

        finished.retain(|m| options.since.map(|since| m.timestamp >= since).unwrap_or(true));
        finished.sort_by_key(|m| m.timestamp);
        finished.truncate(limit);
        Ok(finished)
    }

    async fn collect_signatures(
        &self,
        collect_cap: usize,
        since: Option<i64>,
    ) -> Result<Vec<crate::rpc::SignatureInfo>, MessengerError> {
        let mut collected = Vec::new();
        let mut before: Option<String> = None;

        loop {
            let page = self
                .rpc
                .get_signatures_for_address(
                    self.program_id,
                    GetSignaturesOptions { before: before.clone(), limit: SIGNATURES_PAGE_SIZE },
                )
                .await?;
            if page.is_empty() {
                break;
            }

            before = page.last().map(|s| s.signature.clone());
            let mut stop = false;
            for sig in page {
                if let Some(since) = since {
                    if sig.block_time.map(|t| t < since).unwrap_or(false) {
                        stop = true;
                        continue;
                    }
                }
                collected.push(sig);
                if collected.len() >= collect_cap {
                    stop = true;
                }
            }
            if stop {
                break;
            }
        }

        Ok(collected)
    }

    /// Opens a live log subscription and delivers reassembled messages to `on_message` (§4.8 `listen`).
    pub async fn listen<F>(&self, on_message: F) -> Result<ListenHandle, MessengerError>
    where
        F: Fn(Message) + Send + Sync + 'static,
    {
        let mut subscription = self.rpc.subscribe_logs(self.program_id).await?;
        let identity = self.signer.fee_payer();
        let encryption = Arc::clone(&self.encryption);
        let identity_secret = self.identity_secret_for_crypto.clone();
        let callback = Arc::new(on_message);
        let (cancel_tx, mut cancel_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let buffer = ReassemblyBuffer::new();
            loop {
                tokio::select! {
                    _ = &mut cancel_rx => {
                        debug!("listen session cancelled");
                        break;
                    }
                    notification = subscription.next() => {
                        match notification {
                            None => break,
                            Some(Err(e)) => {
                                warn!(error = %e, "log subscription error, ending listen session");
                                break;
                            }
                            Some(Ok(note)) => {
                                if note.err.is_some() {
                                    continue;
                                }
                                let encryption_secret = encryption.read().await.as_ref().map(|k| k.secret.clone());
                                for event in event::parse_events(&note.logs) {
                                    if event.recipient != identity {
                                        continue;
                                    }
                                    let Some(plaintext) = decrypt_event(
                                        &event,
                                        encryption_secret.as_ref(),
                                        identity_secret.as_ref(),
                                    ) else {
                                        continue;
                                    };
                                    let Ok(decoded) = frame::decode(&plaintext) else { continue };
                                    if let Some(message) = buffer.ingest(
                                        event.sender,
                                        event.recipient,
                                        decoded,
                                        note.signature.clone(),
                                        event.timestamp,
                                    ) {
                                        callback(message);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        });

        Ok(ListenHandle { cancel: Some(cancel_tx), task })
    }
}

fn decrypt_event(
    event: &MessageSentEvent,
    encryption_secret: Option<&SigningKey>,
    identity_secret: Option<&SigningKey>,
) -> Option<Vec<u8>> {
    let sender_public = VerifyingKey::from_bytes(&event.sender).ok()?;
    if let Some(secret) = encryption_secret {
        if let Some(pt) = crypto::decrypt(&event.ciphertext, &event.nonce, &sender_public, secret) {
            return Some(pt);
        }
    }
    if let Some(secret) = identity_secret {
        if let Some(pt) = crypto::decrypt(&event.ciphertext, &event.nonce, &sender_public, secret) {
            return Some(pt);
        }
    }
    None
}
