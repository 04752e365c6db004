// Path: src/address.rs
//! Registry account address derivation (§4.4).
//!
//! The registry entry for an identity lives at a deterministic
//! program-derived address (PDA): a 32-byte value computed from the
//! program id and a set of seeds, chosen such that it is provably *not* a
//! point on the Ed25519 curve (so no private key can ever exist for it).
//! This mirrors the host chain's canonical PDA algorithm: hash
//! `seeds || bump || program_id || "ProgramDerivedAddress"` with SHA-256,
//! starting the bump search at 255 and decrementing until the digest fails
//! to decompress as a curve point.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Seed prefix for messenger registry accounts.
pub const REGISTRY_SEED: &[u8] = b"messenger";

/// A 32-byte on-chain address.
pub type Address = [u8; 32];

/// Derives the registry account address for `identity_key` under `program_id`.
///
/// Pure and deterministic: two calls with the same inputs return the same
/// address, and changing a single byte of either input changes it.
pub fn derive_registry_address(identity_key: &Address, program_id: &Address) -> Address {
    find_program_address(&[REGISTRY_SEED, identity_key], program_id).0
}

/// Finds a program-derived address and its bump seed for arbitrary `seeds`.
///
/// Starts the bump search at 255 (the conventional "canonical bump") and
/// walks down until the resulting digest is off the Ed25519 curve.
pub fn find_program_address(seeds: &[&[u8]], program_id: &Address) -> (Address, u8) {
    for bump in (0..=u8::MAX).rev() {
        if let Some(addr) = create_program_address(seeds, &[bump], program_id) {
            return (addr, bump);
        }
    }
    unreachable!("exhausted all 256 bump seeds without finding an off-curve address")
}

/// Computes the candidate address for `seeds` plus an explicit `bump`, or
/// `None` if the result happens to land on the Ed25519 curve.
fn create_program_address(seeds: &[&[u8]], bump: &[u8], program_id: &Address) -> Option<Address> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(bump);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);
    let digest: [u8; 32] = hasher.finalize().into();

    // A valid PDA must NOT be a point on the curve (no private key exists for it).
    if CompressedEdwardsY(digest).decompress().is_some() {
        return None;
    }
    Some(digest)
}
