// Path: src/signer/mod.rs
//! Signing abstraction (§4.6): local-key signing vs. an externally delegated signer.
//!
//! Both variants implement the same [`Signer`] trait so the messenger core
//! never needs to know which one it is talking to. Per §9, the encryption
//! private key must never reach an external signer: only the compiled,
//! unsigned transaction bytes cross that boundary.

pub mod external;
pub mod local;

use async_trait::async_trait;

use crate::address::Address;
use crate::error::MessengerError;
use crate::wire::Instruction;

/// A transaction message not yet signed: a recent blockhash, the fee payer,
/// and the instructions to execute, in order.
#[derive(Debug, Clone)]
pub struct UnsignedTransaction {
    /// A recent blockhash, binding the transaction to a narrow validity window.
    pub blockhash: [u8; 32],
    /// The account that pays fees and must co-sign.
    pub fee_payer: Address,
    /// Instructions to execute, in order.
    pub instructions: Vec<Instruction>,
}

impl UnsignedTransaction {
    /// Compiles this message into its canonical byte form.
    ///
    /// Layout: `version(1=0), blockhash(32), fee_payer(32),
    /// num_instructions(u8), { program_id(32), num_accounts(u8),
    /// { pubkey(32), flags(1) } * , data_len(u32 LE), data }*`. `flags` bit
    /// 0 is `is_signer`, bit 1 is `is_writable`.
    pub fn compile(&self) -> Vec<u8> {
        let mut out = vec![0u8]; // version 0
        out.extend_from_slice(&self.blockhash);
        out.extend_from_slice(&self.fee_payer);
        out.push(self.instructions.len() as u8);

        for ix in &self.instructions {
            out.extend_from_slice(&ix.program_id);
            out.push(ix.accounts.len() as u8);
            for account in &ix.accounts {
                out.extend_from_slice(&account.pubkey);
                let mut flags = 0u8;
                if account.is_signer {
                    flags |= 0b01;
                }
                if account.is_writable {
                    flags |= 0b10;
                }
                out.push(flags);
            }
            out.extend_from_slice(&(ix.data.len() as u32).to_le_bytes());
            out.extend_from_slice(&ix.data);
        }

        out
    }
}

/// A transaction ready for submission: the compiled message plus one or
/// more signatures prepended by the signer.
#[derive(Debug, Clone)]
pub struct SignedTransaction(pub Vec<u8>);

/// Produces a signed transaction from an unsigned one.
///
/// Implemented by [`local::LocalSigner`] (holds the identity secret) and
/// [`external::ExternalSigner`] (delegates to a callback). Object-safe so
/// the messenger core can hold a `dyn Signer` without committing to which
/// mode it was built with.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The identity address this signer signs for.
    fn fee_payer(&self) -> Address;

    /// Signs `unsigned`, returning a transaction ready to submit.
    async fn sign(&self, unsigned: &UnsignedTransaction) -> Result<SignedTransaction, MessengerError>;
}
