// Path: src/wire/instructions.rs
//! Instruction payload builders for the four messenger program instructions (§4.3, §6).
//!
//! All multi-byte fields are little-endian. Discriminators are the fixed
//! constants the deployed program expects; changing them would silently
//! target the wrong instruction handler, so they are locked here rather
//! than derived.

use crate::address::Address;
use crate::wire::{AccountMeta, Instruction};

/// `send_message` instruction discriminator.
pub const SEND_MESSAGE_DISCRIMINATOR: [u8; 8] = [0x39, 0x28, 0x22, 0xB2, 0xBD, 0x0A, 0x41, 0x1A];
/// `register` instruction discriminator.
pub const REGISTER_DISCRIMINATOR: [u8; 8] = [0xD3, 0x7C, 0x43, 0x0F, 0xD3, 0xC2, 0xB2, 0xF0];
/// `update_encryption_key` instruction discriminator.
pub const UPDATE_ENCRYPTION_KEY_DISCRIMINATOR: [u8; 8] =
    [0x5C, 0xE9, 0x1D, 0x65, 0x98, 0x61, 0x6E, 0xEB];
/// `deregister` instruction discriminator.
pub const DEREGISTER_DISCRIMINATOR: [u8; 8] = [0xA1, 0xB2, 0x27, 0xBD, 0xE7, 0xE0, 0x0D, 0xBB];

/// Extra accounts required by the fee-charging variant of `send_message`.
///
/// Two account layouts exist for this instruction (§9): a minimal
/// signer-only form and an extended form that charges a fee. Whichever
/// layout the deployed program expects must be selected consistently; the
/// client never mixes them within a single messenger instance (see
/// `MessengerConfig::fee_accounts` and the deployment-mismatch discussion
/// in the config validation).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeAccounts {
    /// Global fee/program configuration account.
    pub config: Address,
    /// The vault that receives the per-message fee.
    pub fee_vault: Address,
    /// The recipient's registry PDA (read, to confirm the recipient is registered).
    pub recipient_registry: Address,
    /// The recipient's wallet account (credited, in programs that split fees).
    pub recipient_wallet: Address,
    /// The system program account.
    pub system_program: Address,
}

/// Builds a `send_message` instruction.
///
/// `sender` pays and signs. If `fee_accounts` is `Some`, the extended
/// account list is used; otherwise the minimal signer-only list.
pub fn send_message(
    program_id: Address,
    sender: Address,
    recipient: Address,
    ciphertext: &[u8],
    nonce: &[u8; 24],
    fee_accounts: Option<FeeAccounts>,
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 32 + 4 + ciphertext.len() + 24);
    data.extend_from_slice(&SEND_MESSAGE_DISCRIMINATOR);
    data.extend_from_slice(&recipient);
    data.extend_from_slice(&(ciphertext.len() as u32).to_le_bytes());
    data.extend_from_slice(ciphertext);
    data.extend_from_slice(nonce);

    let mut accounts = vec![AccountMeta::writable_signer(sender)];
    if let Some(fees) = fee_accounts {
        accounts.push(AccountMeta::readonly(fees.config));
        accounts.push(AccountMeta::writable(fees.fee_vault));
        accounts.push(AccountMeta::readonly(fees.recipient_registry));
        accounts.push(AccountMeta::writable(fees.recipient_wallet));
        accounts.push(AccountMeta::readonly(fees.system_program));
    }

    Instruction { program_id, accounts, data }
}

/// Builds a `register` instruction.
pub fn register(
    program_id: Address,
    registry_pda: Address,
    owner: Address,
    system_program: Address,
    encryption_pubkey: Address,
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 32);
    data.extend_from_slice(&REGISTER_DISCRIMINATOR);
    data.extend_from_slice(&encryption_pubkey);

    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::writable(registry_pda),
            AccountMeta::writable_signer(owner),
            AccountMeta::readonly(system_program),
        ],
        data,
    }
}

/// Builds an `update_encryption_key` instruction.
pub fn update_encryption_key(
    program_id: Address,
    registry_pda: Address,
    owner: Address,
    new_encryption_pubkey: Address,
) -> Instruction {
    let mut data = Vec::with_capacity(8 + 32);
    data.extend_from_slice(&UPDATE_ENCRYPTION_KEY_DISCRIMINATOR);
    data.extend_from_slice(&new_encryption_pubkey);

    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::writable(registry_pda),
            AccountMeta::readonly_signer(owner),
        ],
        data,
    }
}

/// Builds a `deregister` instruction.
pub fn deregister(program_id: Address, registry_pda: Address, owner: Address) -> Instruction {
    Instruction {
        program_id,
        accounts: vec![
            AccountMeta::writable(registry_pda),
            AccountMeta::writable_signer(owner),
        ],
        data: DEREGISTER_DISCRIMINATOR.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: Address = [1u8; 32];
    const SENDER: Address = [2u8; 32];
    const RECIPIENT: Address = [3u8; 32];
    const PDA: Address = [4u8; 32];
    const OWNER: Address = [5u8; 32];
    const SYSTEM_PROGRAM: Address = [0u8; 32];

    #[test]
    fn send_message_minimal_layout_snapshot() {
        let ct = vec![0xAAu8; 4];
        let nonce = [0x11u8; 24];
        let ix = send_message(PROGRAM, SENDER, RECIPIENT, &ct, &nonce, None);

        assert_eq!(&ix.data[0..8], &SEND_MESSAGE_DISCRIMINATOR);
        assert_eq!(&ix.data[8..40], &RECIPIENT);
        assert_eq!(&ix.data[40..44], &4u32.to_le_bytes());
        assert_eq!(&ix.data[44..48], &ct[..]);
        assert_eq!(&ix.data[48..72], &nonce);
        assert_eq!(ix.accounts.len(), 1);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
    }

    #[test]
    fn send_message_extended_layout_has_fee_accounts() {
        let fees = FeeAccounts {
            config: [9u8; 32],
            fee_vault: [8u8; 32],
            recipient_registry: [7u8; 32],
            recipient_wallet: [6u8; 32],
            system_program: SYSTEM_PROGRAM,
        };
        let ix = send_message(PROGRAM, SENDER, RECIPIENT, b"hi", &[0u8; 24], Some(fees));
        assert_eq!(ix.accounts.len(), 6);
        assert_eq!(ix.accounts[1].pubkey, fees.config);
        assert_eq!(ix.accounts[4].pubkey, fees.recipient_wallet);
        assert!(ix.accounts[4].is_writable);
    }

    #[test]
    fn register_snapshot() {
        let ix = register(PROGRAM, PDA, OWNER, SYSTEM_PROGRAM, [7u8; 32]);
        assert_eq!(&ix.data[0..8], &REGISTER_DISCRIMINATOR);
        assert_eq!(&ix.data[8..40], &[7u8; 32]);
        assert_eq!(ix.accounts.len(), 3);
        assert!(ix.accounts[1].is_signer);
    }

    #[test]
    fn update_encryption_key_snapshot() {
        let ix = update_encryption_key(PROGRAM, PDA, OWNER, [8u8; 32]);
        assert_eq!(&ix.data[0..8], &UPDATE_ENCRYPTION_KEY_DISCRIMINATOR);
        assert_eq!(&ix.data[8..40], &[8u8; 32]);
        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[1].is_signer && !ix.accounts[1].is_writable);
    }

    #[test]
    fn deregister_snapshot() {
        let ix = deregister(PROGRAM, PDA, OWNER);
        assert_eq!(ix.data, DEREGISTER_DISCRIMINATOR.to_vec());
        assert_eq!(ix.accounts.len(), 2);
        assert!(ix.accounts[1].is_signer && ix.accounts[1].is_writable);
    }
}
