//! Key derivation using scrypt.
//!
//! This module derives the 64-byte user key from a passphrase. The first half
//! encrypts data keys, the second half keys the envelope HMAC.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CmdsafeError, Result};

/// Length of the derived user key in bytes.
pub const USER_KEY_LENGTH: usize = 64;

/// Length of freshly generated salts in bytes.
pub const SALT_LENGTH: usize = 32;

/// Largest scrypt working set (128 * r * N bytes) accepted, 1 GiB.
///
/// Cost parameters are read back from the store without authentication, so
/// they are bounded before any memory is committed to them.
pub const MAX_SCRYPT_MEMORY: u64 = 1 << 30;

/// Largest scrypt parallelism accepted.
pub const MAX_SCRYPT_PARALLELISM: u32 = 16;

/// Key derivation functions known to this build, by persisted tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum KdfAlgorithm {
    Scrypt = 0,
}

impl KdfAlgorithm {
    /// Resolve a persisted tag, rejecting anything this build does not know.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(KdfAlgorithm::Scrypt),
            other => Err(CmdsafeError::UnsupportedAlgorithm(format!(
                "key derivation tag {}",
                other
            ))),
        }
    }

    pub fn tag(self) -> u32 {
        self as u32
    }
}

/// scrypt cost parameters.
///
/// These are persisted with every record so that changing the defaults
/// never breaks older records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptParams {
    /// CPU/memory cost (work factor). Must be a power of two greater than 1.
    pub n: u64,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
}

impl Default for ScryptParams {
    /// Interactive defaults: N=16384, r=8, p=1.
    fn default() -> Self {
        Self {
            n: 16384,
            r: 8,
            p: 1,
        }
    }
}

impl ScryptParams {
    pub fn new(n: u64, r: u32, p: u32) -> Self {
        Self { n, r, p }
    }

    /// Check internal consistency and convert to the scrypt crate's form.
    ///
    /// # Errors
    ///
    /// Returns `CmdsafeError::KeyDerivation` if N is not a power of two
    /// greater than 1, r or p is zero, p exceeds [`MAX_SCRYPT_PARALLELISM`],
    /// or the working set exceeds [`MAX_SCRYPT_MEMORY`].
    pub fn validate(&self) -> Result<scrypt::Params> {
        if self.n < 2 || !self.n.is_power_of_two() {
            return Err(CmdsafeError::KeyDerivation(format!(
                "work factor N must be a power of two greater than 1 (got {})",
                self.n
            )));
        }
        if self.r == 0 || self.p == 0 {
            return Err(CmdsafeError::KeyDerivation(format!(
                "block size and parallelism must be positive (got r={}, p={})",
                self.r, self.p
            )));
        }
        if self.p > MAX_SCRYPT_PARALLELISM {
            return Err(CmdsafeError::KeyDerivation(format!(
                "parallelism p={} exceeds the limit of {}",
                self.p, MAX_SCRYPT_PARALLELISM
            )));
        }
        let memory = 128u64
            .checked_mul(u64::from(self.r))
            .and_then(|bytes| bytes.checked_mul(self.n));
        match memory {
            Some(bytes) if bytes <= MAX_SCRYPT_MEMORY => {}
            _ => {
                return Err(CmdsafeError::KeyDerivation(format!(
                    "cost parameters N={}, r={} need more than {} bytes of memory",
                    self.n, self.r, MAX_SCRYPT_MEMORY
                )))
            }
        }
        let log_n = self.n.trailing_zeros() as u8;
        scrypt::Params::new(log_n, self.r, self.p, USER_KEY_LENGTH).map_err(|e| {
            CmdsafeError::KeyDerivation(format!(
                "invalid cost parameters N={}, r={}, p={}: {}",
                self.n, self.r, self.p, e
            ))
        })
    }
}

/// Key material derived from a passphrase.
///
/// The bytes are zeroized when the key is dropped and never shown by `Debug`.
#[derive(Clone, ZeroizeOnDrop)]
pub struct UserKey {
    key: [u8; USER_KEY_LENGTH],
}

impl UserKey {
    /// Create a UserKey from raw bytes.
    pub(crate) fn from_bytes(bytes: [u8; USER_KEY_LENGTH]) -> Self {
        Self { key: bytes }
    }

    /// First half of the key, used to wrap data keys.
    pub fn encryption(&self) -> &[u8] {
        &self.key[..USER_KEY_LENGTH / 2]
    }

    /// Second half of the key, used to authenticate envelopes.
    pub fn hmac(&self) -> &[u8] {
        &self.key[USER_KEY_LENGTH / 2..]
    }

    /// SHA-256 of the full key material.
    ///
    /// Only used as a fast passphrase pre-check; the HMAC remains the authority.
    pub fn hash(&self) -> [u8; 32] {
        let digest = Sha256::digest(self.key);
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }

    /// Get a reference to the raw key bytes.
    ///
    /// # Security
    ///
    /// Avoid storing or logging this value.
    pub fn as_bytes(&self) -> &[u8; USER_KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for UserKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a user key from a passphrase using scrypt.
///
/// Same passphrase, salt and parameters always produce the same key.
///
/// # Examples
///
/// ```
/// use cmdsafe_core::crypto::{derive_key, ScryptParams};
///
/// let params = ScryptParams::new(1024, 8, 1);
/// let key = derive_key(b"my-passphrase", b"unique-salt-per-record", &params).unwrap();
/// assert_eq!(key.encryption().len(), 32);
/// ```
pub fn derive_key(password: &[u8], salt: &[u8], params: &ScryptParams) -> Result<UserKey> {
    if salt.is_empty() {
        return Err(CmdsafeError::KeyDerivation("salt cannot be empty".to_string()));
    }
    let scrypt_params = params.validate()?;

    tracing::debug!(n = params.n, r = params.r, p = params.p, "deriving user key");
    let mut key_bytes = [0u8; USER_KEY_LENGTH];
    scrypt::scrypt(password, salt, &scrypt_params, &mut key_bytes)
        .map_err(|e| CmdsafeError::KeyDerivation(format!("scrypt failed: {}", e)))?;

    let key = UserKey::from_bytes(key_bytes);
    key_bytes.zeroize();
    Ok(key)
}

/// Generate a fresh random salt.
pub fn generate_salt() -> Result<[u8; SALT_LENGTH]> {
    let mut salt = [0u8; SALT_LENGTH];
    super::fill_random(&mut salt).map_err(|e| CmdsafeError::KeyDerivation(e.to_string()))?;
    Ok(salt)
}
