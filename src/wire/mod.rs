// Path: src/wire/mod.rs
//! Wire codec (§4.3): instruction builders, event parsing, registry parsing.
//!
//! None of these types depend on a specific chain SDK; `Instruction` and
//! `AccountMeta` are the minimal shape the signer and RPC layers need to
//! serialize a transaction message.

pub mod event;
pub mod instructions;
pub mod registry;

use crate::address::Address;

/// A single account reference within an instruction, with its signer/writable roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    /// The account's address.
    pub pubkey: Address,
    /// Whether this account must co-sign the transaction.
    pub is_signer: bool,
    /// Whether this account's data may be mutated by the instruction.
    pub is_writable: bool,
}

impl AccountMeta {
    /// A read-only, non-signer account reference.
    pub fn readonly(pubkey: Address) -> Self {
        Self { pubkey, is_signer: false, is_writable: false }
    }

    /// A writable, non-signer account reference.
    pub fn writable(pubkey: Address) -> Self {
        Self { pubkey, is_signer: false, is_writable: true }
    }

    /// A read-only, signing account reference.
    pub fn readonly_signer(pubkey: Address) -> Self {
        Self { pubkey, is_signer: true, is_writable: false }
    }

    /// A writable, signing account reference.
    pub fn writable_signer(pubkey: Address) -> Self {
        Self { pubkey, is_signer: true, is_writable: true }
    }
}

/// A single program instruction: the program to invoke, the accounts it
/// touches, and the opaque data payload built by [`instructions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The program this instruction is addressed to.
    pub program_id: Address,
    /// Accounts referenced by the instruction, in the order the program expects.
    pub accounts: Vec<AccountMeta>,
    /// The encoded instruction payload (discriminator + fields).
    pub data: Vec<u8>,
}
