//! Identities for marketplace participants.
//!
//! Addresses are base58-encoded Ed25519 public keys. Key custody and
//! persistence are out of scope; wallets exist so callers and tests can mint
//! distinct identities and authorize ledger mutations.

use crate::error::{LedgerError, Result};
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A participant address (base58-encoded 32-byte public key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Parse an address from its base58 string form.
    ///
    /// # Errors
    ///
    /// Returns error if the string is not base58 or does not decode to
    /// 32 bytes.
    pub fn parse(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| LedgerError::invalid_address(format!("invalid base58: {e}")))?;
        if bytes.len() != 32 {
            return Err(LedgerError::invalid_address(format!(
                "address must decode to 32 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// Build an address from a raw 32-byte public key.
    #[must_use]
    pub fn from_public_key(key: &[u8; 32]) -> Self {
        Self(bs58::encode(key).into_string())
    }

    /// The base58 string form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// An Ed25519 keypair identifying a marketplace participant.
pub struct Wallet {
    signing_key: SigningKey,
    address: Address,
}

impl Wallet {
    /// Generate a new random wallet.
    ///
    /// Key material comes straight from the operating system's CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns error if random generation fails.
    pub fn generate() -> Result<Self> {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Ok(Self::from_seed(&seed))
    }

    /// Recreate a wallet from a 32-byte secret seed.
    ///
    /// # Errors
    ///
    /// Returns error if the seed is not exactly 32 bytes.
    pub fn from_secret_key(secret: &[u8]) -> Result<Self> {
        let seed: [u8; 32] = secret.try_into().map_err(|_| {
            LedgerError::wallet_error(format!("secret key must be 32 bytes, got {}", secret.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }

    fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let address = Address::from_public_key(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            address,
        }
    }

    /// The wallet's address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The public (verifying) key.
    #[must_use]
    pub fn public_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Sign a message.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        self.signing_key.sign(message)
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}
