//! Symmetric cipher suites.
//!
//! The set of suites is closed and dispatched by the persisted tag. Every
//! suite exposes the same contract: encrypt with a fresh random IV, and
//! decrypt given key, IV and ciphertext.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};

use crate::error::{CmdsafeError, Result};

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Cipher suites known to this build, by persisted tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CipherSuite {
    /// AES-256 in counter mode with a 128-bit big-endian counter.
    Aes256Ctr = 0,
}

impl CipherSuite {
    /// Resolve a persisted tag, rejecting anything this build does not know.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(CipherSuite::Aes256Ctr),
            other => Err(CmdsafeError::UnsupportedAlgorithm(format!(
                "cipher tag {}",
                other
            ))),
        }
    }

    pub fn tag(self) -> u32 {
        self as u32
    }

    /// Key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            CipherSuite::Aes256Ctr => 32,
        }
    }

    /// IV length in bytes.
    pub fn iv_len(self) -> usize {
        match self {
            CipherSuite::Aes256Ctr => 16,
        }
    }

    /// Encrypt `plaintext` under `key` with a freshly generated IV.
    ///
    /// Returns `(iv, ciphertext)`.
    pub fn encrypt(self, key: &[u8], plaintext: &[u8]) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut iv = vec![0u8; self.iv_len()];
        super::fill_random(&mut iv)?;

        let mut ciphertext = plaintext.to_vec();
        self.apply(key, &iv, &mut ciphertext)?;
        Ok((iv, ciphertext))
    }

    /// Decrypt `ciphertext` under `key` and `iv`.
    pub fn decrypt(self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        let mut plaintext = ciphertext.to_vec();
        self.apply(key, iv, &mut plaintext)?;
        Ok(plaintext)
    }

    fn apply(self, key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<()> {
        if key.len() != self.key_len() {
            return Err(CmdsafeError::Crypto(format!(
                "wrong key length, want {}, got {}",
                self.key_len(),
                key.len()
            )));
        }
        if iv.len() != self.iv_len() {
            return Err(CmdsafeError::Crypto(format!(
                "wrong IV length, want {}, got {}",
                self.iv_len(),
                iv.len()
            )));
        }
        match self {
            CipherSuite::Aes256Ctr => {
                let mut cipher = Aes256Ctr::new_from_slices(key, iv)
                    .map_err(|e| CmdsafeError::Crypto(format!("AES-CTR setup failed: {}", e)))?;
                cipher.apply_keystream(buf);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nist_ctr_vector() {
        // NIST SP 800-38A F.5.5 CTR-AES256.Encrypt, first block.
        let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
            .unwrap();
        let iv = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();

        let ciphertext = CipherSuite::Aes256Ctr
            .decrypt(&key, &iv, &plaintext)
            .unwrap();
        assert_eq!(hex::encode(ciphertext), "601ec313775789a5b7a7f504bbf3d228");
    }

    #[test]
    fn test_fresh_iv_per_encryption() {
        let key = [7u8; 32];
        let (iv1, ct1) = CipherSuite::Aes256Ctr.encrypt(&key, b"same plaintext").unwrap();
        let (iv2, ct2) = CipherSuite::Aes256Ctr.encrypt(&key, b"same plaintext").unwrap();

        assert_eq!(iv1.len(), 16);
        assert_ne!(iv1, iv2);
        assert_ne!(ct1, ct2);
    }

    #[test]
    fn test_decrypt_reverses_encrypt() {
        let key = [9u8; 32];
        let (iv, ct) = CipherSuite::Aes256Ctr.encrypt(&key, b"ls -l /tmp").unwrap();
        let pt = CipherSuite::Aes256Ctr.decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt, b"ls -l /tmp");
    }

    #[test]
    fn test_wrong_lengths_rejected() {
        let suite = CipherSuite::Aes256Ctr;
        assert!(suite.decrypt(&[0u8; 16], &[0u8; 16], b"x").is_err());
        assert!(suite.decrypt(&[0u8; 32], &[0u8; 8], b"x").is_err());
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert_eq!(CipherSuite::from_tag(0).unwrap(), CipherSuite::Aes256Ctr);
        assert!(matches!(
            CipherSuite::from_tag(1),
            Err(CmdsafeError::UnsupportedAlgorithm(_))
        ));
    }
}
