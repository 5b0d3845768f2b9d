//! AES-256-GCM encryption of individual record fields.
//!
//! Stored values look like `enc:v1:<base64(nonce || ciphertext)>`. The prefix
//! lets readers tell ciphertext apart from values written before encryption
//! was switched on.

use crate::error::PersistenceError;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::Rng;
use std::fmt;

pub const CIPHERTEXT_PREFIX: &str = "enc:v1:";

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

#[derive(Clone)]
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("FieldCipher(..)")
    }
}

impl FieldCipher {
    /// Builds a cipher from a 32-byte key given as 64 hex characters.
    pub fn from_hex(key_hex: &str) -> Result<Self, PersistenceError> {
        let bytes = hex::decode(key_hex.trim())
            .map_err(|e| PersistenceError::InvalidKey(e.to_string()))?;
        if bytes.len() != KEY_SIZE {
            return Err(PersistenceError::InvalidKey(format!(
                "expected {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes)
            .map_err(|e| PersistenceError::InvalidKey(e.to_string()))?;
        Ok(FieldCipher { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, PersistenceError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| PersistenceError::Encryption(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(format!("{}{}", CIPHERTEXT_PREFIX, BASE64.encode(combined)))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, PersistenceError> {
        let encoded = stored.strip_prefix(CIPHERTEXT_PREFIX).ok_or_else(|| {
            PersistenceError::Decryption("value is not ciphertext".to_string())
        })?;
        let combined = BASE64
            .decode(encoded)
            .map_err(|e| PersistenceError::Decryption(e.to_string()))?;

        if combined.len() < NONCE_SIZE {
            return Err(PersistenceError::Decryption(
                "ciphertext too short".to_string(),
            ));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| PersistenceError::Decryption(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| PersistenceError::Decryption(e.to_string()))
    }
}

/// Whether `value` was produced by [`FieldCipher::encrypt`].
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(CIPHERTEXT_PREFIX)
}
