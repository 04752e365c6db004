// Path: src/config.rs
//! Construction-time configuration (§6, SPEC_FULL §A).
//!
//! `MessengerConfig` is built through [`MessengerConfigBuilder`], which
//! performs every validation this crate can do without a network call;
//! anything wrong with the configuration is a [`ConfigError`] raised from
//! `build()`, never later (§7: "Configuration... fatal at construction").

use std::path::PathBuf;

use ed25519_dalek::SigningKey;

use crate::address::Address;
use crate::error::ConfigError;
use crate::keystore::default_keys_dir;
use crate::signer::external::SignCallback;
use crate::wire::instructions::FeeAccounts;

/// The library-provided default program id.
///
/// Deployments targeting a different program (or a local validator for
/// testing) should override this via [`MessengerConfigBuilder::program_id`].
pub const DEFAULT_PROGRAM_ID: Address = [
    0x4d, 0x65, 0x73, 0x73, 0x65, 0x6e, 0x67, 0x65, 0x72, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31,
    0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31, 0x31,
];

/// Which identity-signing strategy the messenger uses (§4.6).
pub enum SigningMode {
    /// The process holds the identity secret directly.
    Local(SigningKey),
    /// Signing is delegated to an external callback.
    External {
        /// The identity's public address.
        wallet_address: Address,
        /// The delegated signing callback.
        callback: SignCallback,
    },
}

/// Fully validated construction-time configuration.
pub struct MessengerConfig {
    /// HTTP RPC endpoint.
    pub rpc_url: String,
    /// WS endpoint for `listen`; derived from `rpc_url` if not overridden.
    pub ws_url: String,
    /// The messenger program id.
    pub program_id: Address,
    /// Directory the local encryption keypair is stored in.
    pub keys_dir: PathBuf,
    /// How transactions get signed.
    pub signing_mode: SigningMode,
    /// Accounts for the fee-charging `send_message` layout, if the deployed program expects it.
    pub fee_accounts: Option<FeeAccounts>,
}

/// Builds a [`MessengerConfig`], deferring all validation to [`build`](Self::build).
#[derive(Default)]
pub struct MessengerConfigBuilder {
    rpc_url: Option<String>,
    ws_url: Option<String>,
    program_id: Option<Address>,
    keys_dir: Option<PathBuf>,
    identity_secret: Option<Vec<u8>>,
    wallet_address: Option<Address>,
    signer_callback: Option<SignCallback>,
    fee_accounts: Option<FeeAccounts>,
}

impl MessengerConfigBuilder {
    /// Starts a new, empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the required HTTP RPC endpoint.
    pub fn rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    /// Overrides the WS endpoint used by `listen`.
    pub fn ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }

    /// Overrides the messenger program id.
    pub fn program_id(mut self, program_id: Address) -> Self {
        self.program_id = Some(program_id);
        self
    }

    /// Overrides the encryption-key storage directory.
    pub fn keys_dir(mut self, keys_dir: impl Into<PathBuf>) -> Self {
        self.keys_dir = Some(keys_dir.into());
        self
    }

    /// Self-custody mode: the process holds the identity secret bytes directly.
    pub fn identity_secret(mut self, secret_bytes: impl Into<Vec<u8>>) -> Self {
        self.identity_secret = Some(secret_bytes.into());
        self
    }

    /// External-signer mode: supply the identity's public address.
    pub fn wallet_address(mut self, wallet_address: Address) -> Self {
        self.wallet_address = Some(wallet_address);
        self
    }

    /// External-signer mode: supply the delegated signing callback.
    pub fn signer_callback(mut self, callback: SignCallback) -> Self {
        self.signer_callback = Some(callback);
        self
    }

    /// Declares that `send_message` must use the fee-charging account layout.
    pub fn fee_accounts(mut self, fee_accounts: FeeAccounts) -> Self {
        self.fee_accounts = Some(fee_accounts);
        self
    }

    /// Validates the accumulated options and produces a [`MessengerConfig`].
    pub fn build(self) -> Result<MessengerConfig, ConfigError> {
        let rpc_url = self.rpc_url.ok_or(ConfigError::MissingField("rpc_url"))?;
        url::Url::parse(&rpc_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

        let ws_url = match self.ws_url {
            Some(url) => url,
            None => crate::rpc::default_ws_url(&rpc_url)
                .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?,
        };

        let signing_mode = match (self.identity_secret, self.wallet_address, self.signer_callback)
        {
            (Some(secret_bytes), None, None) => {
                let seed: [u8; 32] = secret_bytes
                    .as_slice()
                    .get(..32)
                    .and_then(|s| s.try_into().ok())
                    .ok_or_else(|| {
                        ConfigError::InvalidIdentitySecret("expected a 32-byte seed".into())
                    })?;
                SigningMode::Local(SigningKey::from_bytes(&seed))
            }
            (None, Some(wallet_address), Some(callback)) => {
                SigningMode::External { wallet_address, callback }
            }
            _ => return Err(ConfigError::ConflictingSigningMode),
        };

        Ok(MessengerConfig {
            rpc_url,
            ws_url,
            program_id: self.program_id.unwrap_or(DEFAULT_PROGRAM_ID),
            keys_dir: self.keys_dir.unwrap_or_else(default_keys_dir),
            signing_mode,
            fee_accounts: self.fee_accounts,
        })
    }
}
