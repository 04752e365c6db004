// Path: src/crypto/mod.rs
//! Authenticated public-key encryption for message payloads (§4.1).
//!
//! Identities on chain are Ed25519 signing keys. Confidentiality reuses
//! those keys by converting them to X25519 via the standard birational map
//! and running X25519 Diffie-Hellman followed by XSalsa20-Poly1305 (the
//! "NaCl box" construction), rather than minting a second keypair per
//! counterparty. This lets a sender encrypt to a recipient's bare identity
//! key even if that recipient has never published an encryption key.

use crypto_box::aead::{Aead, AeadCore, OsRng as AeadOsRng};
use crypto_box::{PublicKey as BoxPublicKey, SalsaBox, SecretKey as BoxSecretKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha512};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Length of the random nonce used for every encryption.
pub const NONCE_LEN: usize = 24;

/// Converts an Ed25519 verifying key to its X25519 Montgomery-form public key.
fn ed25519_public_to_x25519(key: &VerifyingKey) -> BoxPublicKey {
    let montgomery = key.to_montgomery();
    BoxPublicKey::from(montgomery.to_bytes())
}

/// Converts an Ed25519 signing key to its X25519 scalar (private key).
///
/// This is the standard Ed25519-to-X25519 secret conversion (the same one
/// `libsodium`'s `crypto_sign_ed25519_sk_to_curve25519` performs): SHA-512
/// the 32-byte seed, keep the low half, and apply the usual X25519
/// clamping (clear the low 3 bits and the top bit, set the second-highest
/// bit). This is the private-key counterpart to `VerifyingKey::to_montgomery`.
fn ed25519_secret_to_x25519(key: &SigningKey) -> BoxSecretKey {
    let hash = Zeroizing::new(Sha512::digest(key.to_bytes()));
    let mut scalar_bytes: Zeroizing<[u8; 32]> = Zeroizing::new(
        hash.get(..32)
            .and_then(|s| s.try_into().ok())
            .unwrap_or([0u8; 32]),
    );

    if let [first, .., last] = &mut *scalar_bytes {
        *first &= 248;
        *last &= 127;
        *last |= 64;
    }

    BoxSecretKey::from(*scalar_bytes)
}

/// Encrypts `plaintext` for `recipient_encryption_public` using `sender_identity_secret`.
///
/// Returns `(ciphertext, nonce)`. A fresh random nonce is drawn for every call.
pub fn encrypt(
    plaintext: &[u8],
    sender_identity_secret: &SigningKey,
    recipient_encryption_public: &VerifyingKey,
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), CryptoError> {
    let secret = ed25519_secret_to_x25519(sender_identity_secret);
    let public = ed25519_public_to_x25519(recipient_encryption_public);
    let sbox = SalsaBox::new(&public, &secret);

    let nonce = SalsaBox::generate_nonce(&mut AeadOsRng);
    let ciphertext = sbox
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(nonce.as_slice());
    Ok((ciphertext, nonce_bytes))
}

/// Decrypts `ciphertext` sent by `counterparty_identity_public`, using
/// `my_encryption_secret` as the receiving half of the DH exchange.
///
/// Returns `None` on authentication failure; never panics. Per §7, callers
/// in a receive pipeline should treat `None` as "skip this event" rather
/// than surface an error.
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_LEN],
    counterparty_identity_public: &VerifyingKey,
    my_encryption_secret: &SigningKey,
) -> Option<Vec<u8>> {
    let secret = ed25519_secret_to_x25519(my_encryption_secret);
    let public = ed25519_public_to_x25519(counterparty_identity_public);
    let sbox = SalsaBox::new(&public, &secret);

    let nonce = crypto_box::Nonce::clone_from_slice(nonce);
    sbox.decrypt(&nonce, ciphertext).ok()
}
