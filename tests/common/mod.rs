//! An in-memory fake chain implementing [`solana_messenger::rpc::RpcGateway`].
//!
//! Decodes the exact byte formats `UnsignedTransaction::compile` and the
//! instruction builders produce, so the messenger core runs against this
//! fake exactly as it would against a real validator, without a network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use solana_messenger::rpc::{
    AccountInfo, GetSignaturesOptions, LogSubscription, LogsNotification, RpcGateway,
    SignatureInfo, SignatureStatus, TransactionView,
};
use solana_messenger::wire::instructions::{
    DEREGISTER_DISCRIMINATOR, REGISTER_DISCRIMINATOR, SEND_MESSAGE_DISCRIMINATOR,
    UPDATE_ENCRYPTION_KEY_DISCRIMINATOR,
};
use solana_messenger::{config::MessengerConfig, Messenger};
use tokio::sync::mpsc;

type Address = [u8; 32];

struct DecodedInstruction {
    program_id: Address,
    accounts: Vec<Address>,
    data: Vec<u8>,
}

struct DecodedTransaction {
    fee_payer: Address,
    instructions: Vec<DecodedInstruction>,
}

/// Parses the wire format `UnsignedTransaction::compile` produces, skipping
/// the leading 64-byte signature that `LocalSigner` prepends.
fn decode_signed_tx(bytes: &[u8]) -> DecodedTransaction {
    let message = &bytes[64..];
    let mut fee_payer = [0u8; 32];
    fee_payer.copy_from_slice(&message[33..65]);
    let mut offset = 65;
    let num_instructions = message[offset] as usize;
    offset += 1;

    let mut instructions = Vec::with_capacity(num_instructions);
    for _ in 0..num_instructions {
        let mut program_id = [0u8; 32];
        program_id.copy_from_slice(&message[offset..offset + 32]);
        offset += 32;
        let num_accounts = message[offset] as usize;
        offset += 1;
        let mut accounts = Vec::with_capacity(num_accounts);
        for _ in 0..num_accounts {
            let mut pubkey = [0u8; 32];
            pubkey.copy_from_slice(&message[offset..offset + 32]);
            accounts.push(pubkey);
            offset += 33; // pubkey + flags byte
        }
        let data_len = u32::from_le_bytes(message[offset..offset + 4].try_into().unwrap()) as usize;
        offset += 4;
        let data = message[offset..offset + data_len].to_vec();
        offset += data_len;
        instructions.push(DecodedInstruction { program_id, accounts, data });
    }

    DecodedTransaction { fee_payer, instructions }
}

struct StoredTx {
    signature: String,
    log_messages: Vec<String>,
    block_time: i64,
}

struct ChainState {
    accounts: HashMap<Address, Vec<u8>>,
    txs: Vec<StoredTx>,
    subscribers: HashMap<u64, mpsc::Sender<Result<LogsNotification, solana_messenger::error::RpcError>>>,
}

/// A fake, in-memory chain good enough to drive the full messenger pipeline.
pub struct FakeChain {
    program_id: Address,
    state: Mutex<ChainState>,
    sig_counter: AtomicU64,
    clock: AtomicI64,
    sub_counter: AtomicU64,
}

impl FakeChain {
    /// Builds an empty chain for `program_id`.
    pub fn new(program_id: Address) -> Arc<Self> {
        Arc::new(Self {
            program_id,
            state: Mutex::new(ChainState {
                accounts: HashMap::new(),
                txs: Vec::new(),
                subscribers: HashMap::new(),
            }),
            sig_counter: AtomicU64::new(0),
            clock: AtomicI64::new(1_700_000_000),
            sub_counter: AtomicU64::new(0),
        })
    }

    fn next_signature(&self) -> String {
        let n = self.sig_counter.fetch_add(1, Ordering::SeqCst);
        format!("fakesig-{n}")
    }

    fn next_timestamp(&self) -> i64 {
        self.clock.fetch_add(1, Ordering::SeqCst)
    }

    fn apply_register(&self, state: &mut ChainState, ix: &DecodedInstruction) {
        let registry_pda = ix.accounts[0];
        let owner = ix.accounts[1];
        let encryption_key: Address = ix.data[8..40].try_into().unwrap();
        let mut data = vec![0u8; 8];
        data.extend_from_slice(&owner);
        data.extend_from_slice(&encryption_key);
        state.accounts.insert(registry_pda, data);
    }

    fn apply_update(&self, state: &mut ChainState, ix: &DecodedInstruction) {
        let registry_pda = ix.accounts[0];
        let new_key: Address = ix.data[8..40].try_into().unwrap();
        if let Some(data) = state.accounts.get_mut(&registry_pda) {
            data[40..72].copy_from_slice(&new_key);
        }
    }

    fn apply_deregister(&self, state: &mut ChainState, ix: &DecodedInstruction) {
        let registry_pda = ix.accounts[0];
        state.accounts.remove(&registry_pda);
    }

    fn apply_send_message(&self, ix: &DecodedInstruction, sender: Address, timestamp: i64) -> String {
        let recipient: Address = ix.data[8..40].try_into().unwrap();
        let ct_len = u32::from_le_bytes(ix.data[40..44].try_into().unwrap()) as usize;
        let ciphertext = &ix.data[44..44 + ct_len];
        let nonce = &ix.data[44 + ct_len..44 + ct_len + 24];

        let mut raw = Vec::new();
        raw.extend_from_slice(&solana_messenger::wire::event::MESSAGE_SENT_DISCRIMINATOR);
        raw.extend_from_slice(&sender);
        raw.extend_from_slice(&recipient);
        raw.extend_from_slice(&(ct_len as u32).to_le_bytes());
        raw.extend_from_slice(ciphertext);
        raw.extend_from_slice(nonce);
        raw.extend_from_slice(&timestamp.to_le_bytes());

        use base64::Engine;
        format!("Program data: {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }
}

#[async_trait]
impl RpcGateway for FakeChain {
    async fn get_latest_blockhash(&self) -> Result<[u8; 32], solana_messenger::error::RpcError> {
        Ok([0x42u8; 32])
    }

    async fn send_transaction(&self, signed_tx: &[u8]) -> Result<String, solana_messenger::error::RpcError> {
        let tx = decode_signed_tx(signed_tx);
        let signature = self.next_signature();
        let timestamp = self.next_timestamp();

        let mut state = self.state.lock().unwrap();
        let mut log_messages = Vec::new();
        for ix in &tx.instructions {
            if ix.program_id != self.program_id {
                continue;
            }
            let disc: [u8; 8] = ix.data[0..8].try_into().unwrap();
            match disc {
                d if d == REGISTER_DISCRIMINATOR => self.apply_register(&mut state, ix),
                d if d == UPDATE_ENCRYPTION_KEY_DISCRIMINATOR => self.apply_update(&mut state, ix),
                d if d == DEREGISTER_DISCRIMINATOR => self.apply_deregister(&mut state, ix),
                d if d == SEND_MESSAGE_DISCRIMINATOR => {
                    let line = self.apply_send_message(ix, tx.fee_payer, timestamp);
                    log_messages.push(line);
                }
                _ => {}
            }
        }

        state.txs.push(StoredTx { signature: signature.clone(), log_messages: log_messages.clone(), block_time: timestamp });

        if !log_messages.is_empty() {
            let notification = LogsNotification { signature: signature.clone(), logs: log_messages, err: None };
            for sender in state.subscribers.values() {
                let _ = sender.try_send(Ok(notification.clone()));
            }
        }

        Ok(signature)
    }

    async fn get_signature_statuses(
        &self,
        signatures: &[String],
    ) -> Result<Vec<Option<SignatureStatus>>, solana_messenger::error::RpcError> {
        let state = self.state.lock().unwrap();
        Ok(signatures
            .iter()
            .map(|sig| {
                if state.txs.iter().any(|t| &t.signature == sig) {
                    Some(SignatureStatus { confirmed: true, finalized: true, err: None })
                } else {
                    None
                }
            })
            .collect())
    }

    async fn get_signatures_for_address(
        &self,
        _address: Address,
        options: GetSignaturesOptions,
    ) -> Result<Vec<SignatureInfo>, solana_messenger::error::RpcError> {
        let state = self.state.lock().unwrap();
        let mut newest_first: Vec<&StoredTx> = state.txs.iter().rev().collect();

        if let Some(before) = &options.before {
            if let Some(pos) = newest_first.iter().position(|t| &t.signature == before) {
                newest_first = newest_first.split_off(pos + 1);
            } else {
                newest_first.clear();
            }
        }

        newest_first.truncate(options.limit.max(1));
        Ok(newest_first
            .into_iter()
            .map(|t| SignatureInfo { signature: t.signature.clone(), block_time: Some(t.block_time), err: None })
            .collect())
    }

    async fn get_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<TransactionView>, solana_messenger::error::RpcError> {
        let state = self.state.lock().unwrap();
        Ok(state.txs.iter().find(|t| t.signature == signature).map(|t| TransactionView {
            log_messages: t.log_messages.clone(),
            block_time: Some(t.block_time),
        }))
    }

    async fn get_account_info(
        &self,
        address: Address,
    ) -> Result<Option<AccountInfo>, solana_messenger::error::RpcError> {
        let state = self.state.lock().unwrap();
        Ok(state.accounts.get(&address).map(|data| AccountInfo { data: data.clone() }))
    }

    async fn subscribe_logs(&self, _program_id: Address) -> Result<LogSubscription, solana_messenger::error::RpcError> {
        let id = self.sub_counter.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel(256);
        self.state.lock().unwrap().subscribers.insert(id, tx);

        // SAFETY note: this closure cannot reach back into `self` (it would
        // need a 'static borrow), so cancellation here is best-effort for
        // the test harness: dropping the receiver already stops delivery.
        let cancel = move || {};
        Ok(LogSubscription::new(rx, cancel))
    }
}

/// Builds a `Messenger` for `identity`, signing locally, against `chain`.
pub fn build_messenger(
    chain: Arc<FakeChain>,
    identity: SigningKey,
    program_id: Address,
    keys_dir: &std::path::Path,
) -> Messenger {
    let config = MessengerConfig {
        rpc_url: "http://fake.invalid".to_string(),
        ws_url: "ws://fake.invalid".to_string(),
        program_id,
        keys_dir: keys_dir.to_path_buf(),
        signing_mode: solana_messenger::config::SigningMode::Local(identity),
        fee_accounts: None,
    };
    Messenger::new(config, chain)
}
