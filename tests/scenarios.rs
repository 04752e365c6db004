//! End-to-end scenarios S1-S6 (spec §8), driven against an in-memory fake
//! chain so the suite never touches a live network.

mod common;

use std::sync::Arc;

use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use solana_messenger::types::ReadOptions;

use common::{build_messenger, FakeChain};

const PROGRAM_ID: [u8; 32] = [7u8; 32];

fn gen_identity() -> SigningKey {
    SigningKey::generate(&mut OsRng)
}

/// S1: a self-loop standalone message round-trips through send + read.
#[tokio::test]
async fn s1_self_loop_standalone() {
    let chain = FakeChain::new(PROGRAM_ID);
    let dir = tempfile::tempdir().unwrap();
    let identity = gen_identity();
    let identity_address = identity.verifying_key().to_bytes();

    let messenger = build_messenger(Arc::clone(&chain), identity, PROGRAM_ID, dir.path());
    messenger.init().await.unwrap();

    let signatures = messenger
        .send(solana_messenger::types::IdentityKey(identity_address), "gm", None)
        .await
        .unwrap();
    assert_eq!(signatures.len(), 1);

    let messages = messenger.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "gm");
    assert_eq!(messages[0].sender.to_bytes(), identity_address);
    assert_eq!(messages[0].recipient.to_bytes(), identity_address);
    assert_eq!(messages[0].tx_signatures.len(), 1);
}

/// S2: a 1500-byte message is chunked into 3 frames and reassembles whole.
#[tokio::test]
async fn s2_chunked_1500_byte_message() {
    let chain = FakeChain::new(PROGRAM_ID);
    let dir = tempfile::tempdir().unwrap();
    let identity = gen_identity();
    let identity_address = identity.verifying_key().to_bytes();

    let messenger = build_messenger(Arc::clone(&chain), identity, PROGRAM_ID, dir.path());
    messenger.init().await.unwrap();

    let text: String = "x".repeat(1500);
    let signatures = messenger
        .send(solana_messenger::types::IdentityKey(identity_address), &text, None)
        .await
        .unwrap();
    assert_eq!(signatures.len(), 3);

    let messages = messenger.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, text);
    assert_eq!(messages[0].tx_signatures.len(), 3);
}

/// S3: sending to an unregistered recipient falls back to their identity key,
/// and they can still decrypt using their identity secret.
#[tokio::test]
async fn s3_unregistered_recipient() {
    let chain = FakeChain::new(PROGRAM_ID);
    let sender_dir = tempfile::tempdir().unwrap();
    let receiver_dir = tempfile::tempdir().unwrap();

    let sender_identity = gen_identity();
    let receiver_identity = gen_identity();
    let receiver_address = receiver_identity.verifying_key().to_bytes();

    let sender = build_messenger(Arc::clone(&chain), sender_identity, PROGRAM_ID, sender_dir.path());
    sender.init().await.unwrap();

    assert!(sender.lookup_encryption_key(solana_messenger::types::IdentityKey(receiver_address)).await.is_none());

    sender
        .send(solana_messenger::types::IdentityKey(receiver_address), "hi", None)
        .await
        .unwrap();

    let receiver = build_messenger(Arc::clone(&chain), receiver_identity, PROGRAM_ID, receiver_dir.path());
    // Receiver never calls `init`, so only its identity secret is available
    // for decryption (§4.1 send-side/receive-side fallback).
    let messages = receiver.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "hi");
}

/// S4: rotating the encryption key still lets old ciphertexts decrypt, and
/// lookups reflect the new key.
#[tokio::test]
async fn s4_rotate_encryption_key() {
    let chain = FakeChain::new(PROGRAM_ID);
    let dir = tempfile::tempdir().unwrap();
    let identity = gen_identity();
    let identity_address = identity.verifying_key().to_bytes();

    let messenger = build_messenger(Arc::clone(&chain), identity.clone(), PROGRAM_ID, dir.path());
    let (_, wrote_on_first_init) = messenger.init().await.unwrap();
    assert!(wrote_on_first_init);

    let old_key_b58 = messenger
        .lookup_encryption_key(solana_messenger::types::IdentityKey(identity_address))
        .await
        .unwrap();

    // A message sent before rotation, using the registered key at the time.
    messenger
        .send(solana_messenger::types::IdentityKey(identity_address), "before rotation", None)
        .await
        .unwrap();

    let new_key = SigningKey::generate(&mut OsRng).verifying_key();
    messenger.update(new_key).await.unwrap();

    let new_key_b58 = messenger
        .lookup_encryption_key(solana_messenger::types::IdentityKey(identity_address))
        .await
        .unwrap();
    assert_ne!(old_key_b58, new_key_b58);
    assert_eq!(new_key_b58, bs58::encode(new_key.to_bytes()).into_string());

    // The old local encryption secret is still held in-process, so the
    // pre-rotation message still decrypts.
    let messages = messenger.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "before rotation");
}

/// S5: after deregistering, a lookup returns `None`.
#[tokio::test]
async fn s5_deregister_cleanup() {
    let chain = FakeChain::new(PROGRAM_ID);
    let dir = tempfile::tempdir().unwrap();
    let identity = gen_identity();
    let identity_address = identity.verifying_key().to_bytes();

    let messenger = build_messenger(Arc::clone(&chain), identity, PROGRAM_ID, dir.path());
    messenger.init().await.unwrap();
    assert!(messenger
        .lookup_encryption_key(solana_messenger::types::IdentityKey(identity_address))
        .await
        .is_some());

    messenger.deregister().await.unwrap();

    assert!(messenger
        .lookup_encryption_key(solana_messenger::types::IdentityKey(identity_address))
        .await
        .is_none());
}

/// S6: a listener opened before a send, and a `read` performed after it,
/// both deliver the same logical message.
#[tokio::test]
async fn s6_live_vs_history_convergence() {
    let chain = FakeChain::new(PROGRAM_ID);
    let dir = tempfile::tempdir().unwrap();
    let identity = gen_identity();
    let identity_address = identity.verifying_key().to_bytes();

    let messenger = build_messenger(Arc::clone(&chain), identity, PROGRAM_ID, dir.path());
    messenger.init().await.unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = messenger
        .listen(move |message| {
            let _ = tx.send(message);
        })
        .await
        .unwrap();

    let signatures = messenger
        .send(solana_messenger::types::IdentityKey(identity_address), "live and historical", None)
        .await
        .unwrap();

    let live_message = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
        .await
        .expect("listener should deliver the message before timing out")
        .expect("channel should not close before delivering");

    handle.unsubscribe().await;

    let history = messenger.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(history.len(), 1);

    assert_eq!(live_message.text, history[0].text);
    assert_eq!(live_message.message_id, history[0].message_id);
    assert_eq!(live_message.timestamp, history[0].timestamp);
    assert_eq!(live_message.tx_signatures, signatures);
    assert_eq!(history[0].tx_signatures, signatures);
}

/// Registered recipients' keys are used instead of the raw identity key.
#[tokio::test]
async fn registered_recipient_uses_registry_key_not_identity_key() {
    let chain = FakeChain::new(PROGRAM_ID);
    let sender_dir = tempfile::tempdir().unwrap();
    let receiver_dir = tempfile::tempdir().unwrap();

    let sender_identity = gen_identity();
    let receiver_identity = gen_identity();
    let receiver_address = receiver_identity.verifying_key().to_bytes();

    let sender = build_messenger(Arc::clone(&chain), sender_identity, PROGRAM_ID, sender_dir.path());
    sender.init().await.unwrap();

    let receiver = build_messenger(Arc::clone(&chain), receiver_identity, PROGRAM_ID, receiver_dir.path());
    receiver.init().await.unwrap();

    let registered: VerifyingKey = VerifyingKey::from_bytes(
        &bs58::decode(
            sender
                .lookup_encryption_key(solana_messenger::types::IdentityKey(receiver_address))
                .await
                .unwrap(),
        )
        .into_vec()
        .unwrap()
        .try_into()
        .unwrap(),
    )
    .unwrap();
    // The registered encryption key must differ from the raw identity key,
    // since the receiver generated a fresh local keypair during `init`.
    assert_ne!(registered.to_bytes(), receiver_address);

    sender
        .send(solana_messenger::types::IdentityKey(receiver_address), "registered path", None)
        .await
        .unwrap();

    let messages = receiver.read(ReadOptions { since: None, limit: 10 }).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].text, "registered path");
}
