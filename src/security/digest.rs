use crate::error::PersistenceError;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// One-way digest used to store token values.
///
/// Both variants are deterministic, so a digest computed when a token is
/// written can be recomputed from the raw value to find it again.
#[derive(Clone, PartialEq)]
pub enum TokenDigest {
    Sha256,
    /// SHA-256 HMAC keyed with a server-side pepper.
    HmacSha256 { pepper: Vec<u8> },
}

impl fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TokenDigest::Sha256 => f.write_str("Sha256"),
            TokenDigest::HmacSha256 { .. } => f.write_str("HmacSha256 { .. }"),
        }
    }
}

impl TokenDigest {
    pub fn with_pepper(pepper: &str) -> Self {
        TokenDigest::HmacSha256 {
            pepper: pepper.as_bytes().to_vec(),
        }
    }

    /// Lowercase hex digest of `value`.
    pub fn hash(&self, value: &str) -> Result<String, PersistenceError> {
        match self {
            TokenDigest::Sha256 => {
                let mut hasher = Sha256::new();
                hasher.update(value.as_bytes());
                Ok(hex::encode(hasher.finalize()))
            }
            TokenDigest::HmacSha256 { pepper } => {
                let mut mac = HmacSha256::new_from_slice(pepper)
                    .map_err(|e| PersistenceError::Digest(e.to_string()))?;
                mac.update(value.as_bytes());
                Ok(hex::encode(mac.finalize().into_bytes()))
            }
        }
    }
}
