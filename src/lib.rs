// Path: src/lib.rs
//! # solana-messenger Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling around key material and wire
//! parsing.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::indexing_slicing
    )
)]

//! # solana-messenger
//!
//! A client library for encrypted, peer-to-peer messaging whose durable
//! substrate is a public blockchain. Any two identities, addressed by
//! 32-byte Ed25519 public keys, can exchange confidential messages without
//! a relay, mailbox service, or trusted intermediary: the chain sees only
//! ciphertext, sender, recipient, a nonce, and a block-assigned timestamp.
//!
//! ## Architectural role
//!
//! [`Messenger`] is the crate's entry point, one instance per local
//! identity. It is built from a [`config::MessengerConfig`] plus an
//! `Arc<dyn rpc::RpcGateway>` and orchestrates every other module:
//!
//! - [`crypto`]: X25519 + XSalsa20-Poly1305 authenticated encryption,
//!   derived from each identity's Ed25519 signing key.
//! - [`frame`]: splits a plaintext into one or more fixed-header frames
//!   and reassembles them on the receiving side.
//! - [`wire`]: the on-chain program's instruction/event/account ABI.
//! - [`address`]: deterministic registry-account address derivation.
//! - [`keystore`]: local, per-identity encryption keypair persistence.
//! - [`signer`]: local in-process signing vs. a delegated external signer.
//! - [`rpc`]: the gateway trait plus HTTP and WebSocket implementations.
//!
//! A consuming binary (or the test suite) installs its own `tracing`
//! subscriber; this crate only emits events, it never configures one.

/// A crate-wide `Result` alias with [`error::MessengerError`] as the default error.
pub type Result<T, E = error::MessengerError> = std::result::Result<T, E>;

/// Registry account address derivation (§4.4).
pub mod address;
/// Construction-time configuration and validation (§6).
pub mod config;
/// Authenticated public-key encryption for message payloads (§4.1).
pub mod crypto;
/// Crate-wide error types, one `thiserror` enum per concern.
pub mod error;
/// The framed, chunked plaintext codec (§4.2).
pub mod frame;
/// Local encryption-key storage (§4.5).
pub mod keystore;
/// Orchestrates init/register/update/deregister, send, read, and listen (§4.8).
pub mod messenger;
/// The RPC gateway trait plus HTTP/WS implementations (§4.7).
pub mod rpc;
/// Local and externally-delegated transaction signing (§4.6).
pub mod signer;
/// Caller-visible public types: identities, messages, read options (§3).
pub mod types;
/// Instruction builders, event parsing, and registry account parsing (§4.3).
pub mod wire;

pub use config::{MessengerConfig, MessengerConfigBuilder, SigningMode, DEFAULT_PROGRAM_ID};
pub use error::{ErrorCode, MessengerError};
pub use messenger::{ListenHandle, Messenger};
pub use types::{IdentityKey, Message, ReadOptions};
pub use wire::instructions::FeeAccounts;

#[cfg(test)]
mod tests {
    // Canary test to verify test discovery is working across the crate.
    #[test]
    fn crate_canary() {}
}
