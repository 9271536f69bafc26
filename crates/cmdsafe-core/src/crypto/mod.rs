//! Cryptographic operations for cmdsafe.
//!
//! This module provides the envelope cryptography engine:
//! - **kdf**: scrypt key derivation into a 64-byte user key
//! - **cipher**: the AES-256-CTR stream cipher suite
//! - **envelope**: key wrapping, payload encryption and HMAC authentication
//! - **passphrase**: minimum requirements for new passphrases
//!
//! ## Security Model
//!
//! - Each record has its own random data key, wrapped under the user key
//! - Every public envelope field is authenticated with HMAC-SHA256
//! - The HMAC is verified before any other field is used
//! - Key material is zeroized from memory on drop
//!
//! ## Threat Model
//!
//! We defend against:
//! - Theft of the command database
//! - Offline brute-force attacks on the passphrase
//! - Tampering with or swapping stored records
//!
//! We do NOT defend against:
//! - Secrets visible in the argument list of the running child process
//! - Compromised OS / keylogger

pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod passphrase;

pub use cipher::CipherSuite;
pub use envelope::{decrypt, encrypt, CryptoEnvelope, ScryptMeta, UserKeyMeta};
pub use kdf::{derive_key, generate_salt, KdfAlgorithm, ScryptParams, UserKey};
pub use passphrase::validate_passphrase;

/// Fill `buf` from the operating system's random number generator.
pub(crate) fn fill_random(buf: &mut [u8]) -> crate::Result<()> {
    getrandom::getrandom(buf)
        .map_err(|e| crate::CmdsafeError::Crypto(format!("Random number generator failed: {}", e)))
}
