// Path: src/keystore.rs
//! Local encryption-key storage (§4.5).
//!
//! Each identity's locally generated encryption keypair is persisted as a
//! small JSON file, one per identity, under a configurable directory
//! (default `<home>/.solana-messenger/keys`). This is deliberately a much
//! lighter format than an at-rest-encrypted key file: the encryption
//! secret is not the pay-and-sign capability (§9); the key file format (§6)
//! is plain JSON with `publicKey`/`secretKey` byte arrays.

use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::KeyStoreError;

/// Wraps secret key bytes so they are zeroized when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SensitiveBytes(pub Vec<u8>);

#[derive(Serialize, Deserialize)]
struct KeyFile {
    #[serde(rename = "publicKey")]
    public_key: Vec<u8>,
    #[serde(rename = "secretKey")]
    secret_key: Vec<u8>,
}

/// The result of [`load_or_generate`].
pub struct LoadedKeys {
    /// The encryption public key.
    pub public: VerifyingKey,
    /// The encryption secret key.
    pub secret: SigningKey,
    /// The path the keypair lives at (or was just written to).
    pub path: PathBuf,
    /// `true` if a fresh keypair was generated; `false` if one was loaded.
    pub was_generated: bool,
}

/// Returns the default keys directory, `<home>/.solana-messenger/keys`.
pub fn default_keys_dir() -> PathBuf {
    let home = dirs_home();
    home.join(".solana-messenger").join("keys")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Loads the encryption keypair for `identity_key_base58` from `keys_dir`,
/// generating and persisting a fresh one if none exists.
///
/// The file name is the base58 identity key with a `.json` extension. The
/// write is atomic: the new file is written to a sibling temp path and
/// renamed into place, so a crash mid-write never leaves a half-written key
/// file behind.
pub fn load_or_generate(
    identity_key_base58: &str,
    keys_dir: &Path,
) -> Result<LoadedKeys, KeyStoreError> {
    let path = keys_dir.join(format!("{identity_key_base58}.json"));

    if path.exists() {
        let (public, secret) = load(&path)?;
        debug!(path = %path.display(), "loaded existing encryption keypair");
        return Ok(LoadedKeys { public, secret, path, was_generated: false });
    }

    std::fs::create_dir_all(keys_dir).map_err(|e| KeyStoreError::CreateDir {
        path: keys_dir.display().to_string(),
        source: e,
    })?;

    let secret = SigningKey::generate(&mut OsRng);
    let public = secret.verifying_key();
    write_atomic(&path, &public, &secret)?;
    info!(path = %path.display(), "generated new encryption keypair");

    Ok(LoadedKeys { public, secret, path, was_generated: true })
}

fn load(path: &Path) -> Result<(VerifyingKey, SigningKey), KeyStoreError> {
    let raw = std::fs::read(path).map_err(|e| KeyStoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let parsed: KeyFile = serde_json::from_slice(&raw).map_err(|e| KeyStoreError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let secret_bytes: [u8; SECRET_KEY_LENGTH] =
        parsed.secret_key.as_slice().try_into().map_err(|_| KeyStoreError::Malformed {
            path: path.display().to_string(),
            reason: format!("secretKey must be {SECRET_KEY_LENGTH} bytes"),
        })?;
    let mut sensitive = SensitiveBytes(secret_bytes.to_vec());
    // An ed25519-dalek keypair's secret half is its first 32 bytes (seed);
    // bytes 32..64 are the cached public key, redundant with `publicKey` above.
    let seed: [u8; 32] = sensitive
        .0
        .get(..32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| KeyStoreError::Malformed {
            path: path.display().to_string(),
            reason: "secretKey seed truncated".into(),
        })?;
    let secret = SigningKey::from_bytes(&seed);
    sensitive.0.zeroize();

    let public_bytes: [u8; 32] =
        parsed.public_key.as_slice().try_into().map_err(|_| KeyStoreError::Malformed {
            path: path.display().to_string(),
            reason: "publicKey must be 32 bytes".into(),
        })?;
    let public = VerifyingKey::from_bytes(&public_bytes).map_err(|e| KeyStoreError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    Ok((public, secret))
}

fn write_atomic(
    path: &Path,
    public: &VerifyingKey,
    secret: &SigningKey,
) -> Result<(), KeyStoreError> {
    // ed25519-dalek's on-disk convention: secretKey is the 64-byte
    // seed+public-key pair produced by `to_keypair_bytes`, matching the
    // shape most Ed25519 CLI tooling expects.
    let file = KeyFile {
        public_key: public.to_bytes().to_vec(),
        secret_key: secret.to_keypair_bytes().to_vec(),
    };
    let json = serde_json::to_vec_pretty(&file).map_err(|e| KeyStoreError::Malformed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(|e| KeyStoreError::Io {
        path: tmp_path.display().to_string(),
        source: e,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|e| KeyStoreError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
