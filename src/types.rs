// Path: src/types.rs
//! Shared public types (§3).

use crate::address::Address;

/// A 32-byte Ed25519 public key naming a participant, base58-encoded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentityKey(pub Address);

impl IdentityKey {
    /// The raw 32 bytes of this key.
    pub fn to_bytes(self) -> Address {
        self.0
    }

    /// Parses an identity key from its base58 text form.
    pub fn from_base58(s: &str) -> Option<Self> {
        let bytes = bs58::decode(s).into_vec().ok()?;
        let array: Address = bytes.try_into().ok()?;
        Some(Self(array))
    }
}

impl std::fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

/// A caller-visible, fully reassembled message (§3 "Logical message").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The message's sender.
    pub sender: IdentityKey,
    /// The message's recipient.
    pub recipient: IdentityKey,
    /// The decoded UTF-8 text.
    pub text: String,
    /// Block-assigned unix timestamp, in seconds.
    pub timestamp: i64,
    /// The random identifier shared by every chunk of this logical message.
    pub message_id: u64,
    /// Every transaction signature that contributed a chunk, in chunk order.
    pub tx_signatures: Vec<String>,
}

/// Options for [`crate::messenger::Messenger::read`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Only return messages at or after this unix timestamp.
    pub since: Option<i64>,
    /// Maximum number of messages to return.
    pub limit: usize,
}
