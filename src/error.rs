// Path: src/error.rs
//! Crate-wide error types.
//!
//! Each concern gets its own `thiserror` enum, mirroring how the rest of
//! this family of libraries separates `CryptoError` from `StateError` from
//! transport errors rather than collapsing everything into one bag. Every
//! public error additionally implements [`ErrorCode`] so a caller can
//! match or log on a stable string instead of the enum shape.

use thiserror::Error;

/// Assigns a stable, machine-readable string code to an error variant.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while constructing a `Messenger` from a `MessengerConfig`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required option was missing.
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    /// Exactly one of {identity_secret} or {wallet_address, signer_callback} must be set.
    #[error("exactly one of identity_secret or {{wallet_address, signer_callback}} must be provided")]
    ConflictingSigningMode,
    /// `rpc_url` (or `ws_url` override) could not be parsed as a URL.
    #[error("invalid RPC URL: {0}")]
    InvalidUrl(String),
    /// The supplied identity secret was not a valid Ed25519 seed/keypair.
    #[error("invalid identity secret: {0}")]
    InvalidIdentitySecret(String),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "CONFIG_MISSING_FIELD",
            Self::ConflictingSigningMode => "CONFIG_CONFLICTING_SIGNING_MODE",
            Self::InvalidUrl(_) => "CONFIG_INVALID_URL",
            Self::InvalidIdentitySecret(_) => "CONFIG_INVALID_IDENTITY_SECRET",
        }
    }
}

/// Errors from the cryptography layer (§4.1).
#[derive(Debug, Error)]
pub enum CryptoError {
    /// An Ed25519 key could not be converted to its X25519 counterpart.
    #[error("Ed25519 to X25519 key conversion failed: {0}")]
    KeyConversion(String),
    /// A key or signature had the wrong byte length or was otherwise malformed.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    /// Authenticated encryption failed (should not happen for a fresh nonce/valid key).
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
}

impl ErrorCode for CryptoError {
    fn code(&self) -> &'static str {
        match self {
            Self::KeyConversion(_) => "CRYPTO_KEY_CONVERSION_FAILED",
            Self::InvalidKey(_) => "CRYPTO_INVALID_KEY",
            Self::EncryptionFailed(_) => "CRYPTO_ENCRYPTION_FAILED",
        }
    }
}

/// Errors from the wire codec (§4.3) and frame codec (§4.2).
#[derive(Debug, Error)]
pub enum WireError {
    /// Fewer than 13 bytes were given to the frame decoder.
    #[error("frame too short: got {0} bytes, need at least 13")]
    FrameTooShort(usize),
    /// An instruction or account payload had an unexpected length.
    #[error("malformed instruction payload: {0}")]
    MalformedInstruction(String),
    /// The registry account data was too short or had an unrecognized discriminator.
    #[error("malformed registry account: {0}")]
    MalformedRegistryAccount(String),
}

impl ErrorCode for WireError {
    fn code(&self) -> &'static str {
        match self {
            Self::FrameTooShort(_) => "WIRE_FRAME_TOO_SHORT",
            Self::MalformedInstruction(_) => "WIRE_MALFORMED_INSTRUCTION",
            Self::MalformedRegistryAccount(_) => "WIRE_MALFORMED_REGISTRY_ACCOUNT",
        }
    }
}

/// Errors from the key store (§4.5).
#[derive(Debug, Error)]
pub enum KeyStoreError {
    /// The keys directory could not be created.
    #[error("failed to create keys directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The key file could not be read or written.
    #[error("key file I/O error at {path}: {source}")]
    Io {
        /// The key file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The key file contents were not valid JSON or had the wrong shape.
    #[error("malformed key file {path}: {reason}")]
    Malformed {
        /// The key file path.
        path: String,
        /// Why it failed to parse.
        reason: String,
    },
}

impl ErrorCode for KeyStoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::CreateDir { .. } => "KEYSTORE_CREATE_DIR_FAILED",
            Self::Io { .. } => "KEYSTORE_IO_ERROR",
            Self::Malformed { .. } => "KEYSTORE_MALFORMED_FILE",
        }
    }
}

/// Errors surfaced by the RPC gateway (§4.7).
#[derive(Debug, Error)]
pub enum RpcError {
    /// The underlying HTTP transport failed (network, TLS, timeout).
    #[error("RPC transport error: {0}")]
    Transport(String),
    /// The RPC endpoint returned a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Remote {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// The response could not be decoded into the expected shape.
    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),
    /// The log-subscription WebSocket connection failed or was dropped.
    #[error("subscription error: {0}")]
    Subscription(String),
}

impl ErrorCode for RpcError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "RPC_TRANSPORT_ERROR",
            Self::Remote { .. } => "RPC_REMOTE_ERROR",
            Self::MalformedResponse(_) => "RPC_MALFORMED_RESPONSE",
            Self::Subscription(_) => "RPC_SUBSCRIPTION_ERROR",
        }
    }
}

/// The top-level error type returned by `Messenger` operations.
#[derive(Debug, Error)]
pub enum MessengerError {
    /// Construction-time configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A cryptographic operation failed (send-side only; receive-side failures are silent, §7).
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    /// A wire encode/decode step failed.
    #[error(transparent)]
    Wire(#[from] WireError),
    /// The local key store could not be read or written.
    #[error(transparent)]
    KeyStore(#[from] KeyStoreError),
    /// The RPC gateway returned an error.
    #[error(transparent)]
    Rpc(#[from] RpcError),
    /// An encryption-dependent operation was called before `init` in external-signer mode.
    #[error("messenger not initialized: local encryption key is not loaded")]
    NotInitialized,
    /// Submission succeeded for some chunks but a later chunk failed.
    #[error("send failed at chunk {failed_index} of {total}: {source}")]
    PartialSend {
        /// Signatures for chunks that landed before the failure.
        landed: Vec<String>,
        /// The zero-based index of the chunk that failed.
        failed_index: usize,
        /// Total number of chunks in the logical message.
        total: usize,
        /// The underlying error.
        #[source]
        source: Box<MessengerError>,
    },
    /// Confirmation polling exhausted its budget without reaching "confirmed"/"finalized".
    #[error("confirmation timed out for signature {signature}")]
    ConfirmationTimeout {
        /// The signature whose confirmation could not be observed in time.
        signature: String,
    },
}

impl ErrorCode for MessengerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.code(),
            Self::Crypto(e) => e.code(),
            Self::Wire(e) => e.code(),
            Self::KeyStore(e) => e.code(),
            Self::Rpc(e) => e.code(),
            Self::NotInitialized => "MESSENGER_NOT_INITIALIZED",
            Self::PartialSend { .. } => "MESSENGER_PARTIAL_SEND",
            Self::ConfirmationTimeout { .. } => "MESSENGER_CONFIRMATION_TIMEOUT",
        }
    }
}
