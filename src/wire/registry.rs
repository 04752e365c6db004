// Path: src/wire/registry.rs
//! Registry account parsing (§4.3, §6).
//!
//! Layout: `discriminator(8), owner(32), encryption_key(32), ...`. Unlike
//! the instruction and event discriminators, the registry account's
//! discriminator value is not part of the fixed wire ABI this client locks
//! against (it is assigned by the program's account-type registration
//! scheme and is opaque to this parser); only the overall length and the
//! two fields this client reads are validated.

use crate::address::Address;
use crate::error::WireError;

const DISCRIMINATOR_LEN: usize = 8;
const OWNER_OFFSET: usize = DISCRIMINATOR_LEN;
const ENCRYPTION_KEY_OFFSET: usize = OWNER_OFFSET + 32;
const MIN_ACCOUNT_LEN: usize = ENCRYPTION_KEY_OFFSET + 32;

/// The fields of a registry account this client cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryAccount {
    /// The identity that owns this registry entry.
    pub owner: Address,
    /// The identity's currently registered encryption public key.
    pub encryption_key: Address,
}

/// Parses raw account data into its owner and encryption key.
///
/// Fails only if the account is too short to contain both fields; any
/// trailing fields (fee, timestamps) are ignored.
pub fn parse_registry_account(data: &[u8]) -> Result<RegistryAccount, WireError> {
    if data.len() < MIN_ACCOUNT_LEN {
        return Err(WireError::MalformedRegistryAccount(format!(
            "account data is {} bytes, need at least {MIN_ACCOUNT_LEN}",
            data.len()
        )));
    }

    let owner: Address = data
        .get(OWNER_OFFSET..OWNER_OFFSET + 32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| WireError::MalformedRegistryAccount("owner field truncated".into()))?;
    let encryption_key: Address = data
        .get(ENCRYPTION_KEY_OFFSET..ENCRYPTION_KEY_OFFSET + 32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| {
            WireError::MalformedRegistryAccount("encryption_key field truncated".into())
        })?;

    Ok(RegistryAccount { owner, encryption_key })
}
