// Path: src/signer/local.rs
//! Local signer: the process holds the identity secret directly (§4.6).

use async_trait::async_trait;
use ed25519_dalek::{Signer as _, SigningKey};

use crate::address::Address;
use crate::error::MessengerError;
use crate::signer::{SignedTransaction, Signer, UnsignedTransaction};

/// Signs transactions with an in-process Ed25519 identity secret.
///
/// This is the simpler of the two modes: signing never leaves the process,
/// so it cannot suspend or fail for any reason but a coding error.
pub struct LocalSigner {
    identity: SigningKey,
}

impl LocalSigner {
    /// Builds a local signer from an identity secret key.
    pub fn new(identity: SigningKey) -> Self {
        Self { identity }
    }

    /// The identity secret this signer holds, for send-side encryption (§4.1).
    pub fn identity_secret(&self) -> &SigningKey {
        &self.identity
    }
}

#[async_trait]
impl Signer for LocalSigner {
    fn fee_payer(&self) -> Address {
        self.identity.verifying_key().to_bytes()
    }

    async fn sign(&self, unsigned: &UnsignedTransaction) -> Result<SignedTransaction, MessengerError> {
        let message = unsigned.compile();
        let signature = self.identity.sign(&message);

        let mut out = Vec::with_capacity(64 + message.len());
        out.extend_from_slice(&signature.to_bytes());
        out.extend_from_slice(&message);
        Ok(SignedTransaction(out))
    }
}
