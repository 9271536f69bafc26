//! Authenticated envelope encryption.
//!
//! A record is encrypted under its own random data key. The data key is
//! wrapped under the encryption half of the user key and stored, prefixed
//! with its IV, in the envelope's `key` field. An HMAC-SHA256 keyed by the
//! other half of the user key covers every field an attacker could alter.
//!
//! ## HMAC input
//!
//! The MAC is computed over, in this order and without separators:
//!
//! 1. the cipher-suite tag rendered as decimal ASCII (`"0"` for AES-256-CTR)
//! 2. `iv`
//! 3. `key` (key IV followed by the wrapped data key)
//! 4. `data`

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::cipher::CipherSuite;
use super::kdf::{derive_key, KdfAlgorithm, ScryptParams, UserKey};
use crate::error::{CmdsafeError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Length of per-record data keys in bytes.
pub const DATA_KEY_LENGTH: usize = 32;

/// The persisted, authenticated ciphertext container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CryptoEnvelope {
    #[serde(with = "b64")]
    pub hmac: Vec<u8>,
    #[serde(with = "b64")]
    pub iv: Vec<u8>,
    #[serde(with = "b64")]
    pub key: Vec<u8>,
    /// Cipher-suite tag. Kept raw so unknown tags load and are rejected on decrypt.
    pub algorithm: u32,
    #[serde(rename = "userKey")]
    pub user_key: UserKeyMeta,
    #[serde(with = "b64")]
    pub data: Vec<u8>,
}

/// How the user key for an envelope was derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKeyMeta {
    pub algorithm: u32,
    /// SHA-256 of the derived key, for the fast passphrase check.
    #[serde(with = "b64")]
    pub hash: Vec<u8>,
    pub scrypt: ScryptMeta,
}

/// Persisted scrypt salt and cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScryptMeta {
    #[serde(with = "b64")]
    pub salt: Vec<u8>,
    pub n: u64,
    pub r: u32,
    pub p: u32,
}

impl UserKeyMeta {
    /// Describe a key derived with scrypt from `salt` and `params`.
    pub fn scrypt(salt: &[u8], params: ScryptParams, key: &UserKey) -> Self {
        Self {
            algorithm: KdfAlgorithm::Scrypt.tag(),
            hash: key.hash().to_vec(),
            scrypt: ScryptMeta {
                salt: salt.to_vec(),
                n: params.n,
                r: params.r,
                p: params.p,
            },
        }
    }

    /// The persisted scrypt cost parameters.
    pub fn params(&self) -> ScryptParams {
        ScryptParams::new(self.scrypt.n, self.scrypt.r, self.scrypt.p)
    }

    /// Re-derive the user key from `password` with the persisted parameters.
    pub fn derive(&self, password: &[u8]) -> Result<UserKey> {
        match KdfAlgorithm::from_tag(self.algorithm)? {
            KdfAlgorithm::Scrypt => derive_key(password, &self.scrypt.salt, &self.params()),
        }
    }

    /// Fast check that `key` is the key this envelope was sealed with.
    pub fn matches(&self, key: &UserKey) -> bool {
        bool::from(self.hash.as_slice().ct_eq(&key.hash()))
    }
}

impl CryptoEnvelope {
    /// Serialize for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse stored bytes. No field is trusted until `decrypt` verifies it.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| CmdsafeError::Storage(format!("Stored envelope is malformed: {}", e)))
    }
}

/// Encrypt `plaintext` into a new envelope.
///
/// A random data key is generated for this envelope and wrapped under
/// `user_key`. `key_meta` must describe how `user_key` was derived.
pub fn encrypt(
    plaintext: &[u8],
    user_key: &UserKey,
    key_meta: UserKeyMeta,
) -> Result<CryptoEnvelope> {
    // Currently the only supported suite.
    let suite = CipherSuite::Aes256Ctr;

    let mut data_key = Zeroizing::new([0u8; DATA_KEY_LENGTH]);
    super::fill_random(&mut data_key[..])?;

    let (iv, data) = suite.encrypt(&data_key[..], plaintext)?;

    let (key_iv, wrapped) = suite.encrypt(user_key.encryption(), &data_key[..])?;
    let mut key = Vec::with_capacity(key_iv.len() + wrapped.len());
    key.extend_from_slice(&key_iv);
    key.extend_from_slice(&wrapped);

    let hmac = sign(user_key.hmac(), suite.tag(), &iv, &key, &data)?
        .finalize()
        .into_bytes()
        .to_vec();

    tracing::debug!(bytes = plaintext.len(), "sealed envelope");
    Ok(CryptoEnvelope {
        hmac,
        iv,
        key,
        algorithm: suite.tag(),
        user_key: key_meta,
        data,
    })
}

/// Verify and decrypt an envelope.
///
/// Fails closed: unknown suites are rejected first, then the HMAC is checked
/// in constant time, and only then is the data key unwrapped and the payload
/// decrypted. No plaintext is produced unless every check passes.
///
/// # Errors
///
/// - `CmdsafeError::UnsupportedAlgorithm` for an unknown cipher tag
/// - `CmdsafeError::Integrity` if the envelope was altered or `user_key` is wrong
pub fn decrypt(envelope: &CryptoEnvelope, user_key: &UserKey) -> Result<Zeroizing<Vec<u8>>> {
    let suite = CipherSuite::from_tag(envelope.algorithm)?;

    sign(
        user_key.hmac(),
        envelope.algorithm,
        &envelope.iv,
        &envelope.key,
        &envelope.data,
    )?
    .verify_slice(&envelope.hmac)
    .map_err(|_| {
        tracing::warn!("envelope signature mismatch");
        CmdsafeError::Integrity
    })?;

    // A signed envelope with misplaced field boundaries is still tampering.
    let iv_len = suite.iv_len();
    if envelope.iv.len() != iv_len || envelope.key.len() != iv_len + suite.key_len() {
        return Err(CmdsafeError::Integrity);
    }

    let (key_iv, wrapped) = envelope.key.split_at(iv_len);
    let data_key = Zeroizing::new(suite.decrypt(user_key.encryption(), key_iv, wrapped)?);
    let plaintext = Zeroizing::new(suite.decrypt(&data_key, &envelope.iv, &envelope.data)?);

    tracing::debug!(bytes = plaintext.len(), "opened envelope");
    Ok(plaintext)
}

/// Build the envelope MAC over the canonical field sequence.
fn sign(
    hmac_key: &[u8],
    algorithm: u32,
    iv: &[u8],
    key: &[u8],
    data: &[u8],
) -> Result<HmacSha256> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(hmac_key)
        .map_err(|e| CmdsafeError::Crypto(format!("HMAC init failed: {}", e)))?;
    mac.update(algorithm.to_string().as_bytes());
    mac.update(iv);
    mac.update(key);
    mac.update(data);
    Ok(mac)
}

mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
