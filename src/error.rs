use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised at the persistence boundary, either by a hook or by the
/// store behind it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("encryption key unavailable")]
    KeyUnavailable,
    #[error("invalid key material: {0}")]
    InvalidKey(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("digest failed: {0}")]
    Digest(String),
    #[error("invalid changeset: {}", .0.join(", "))]
    InvalidChangeset(Vec<String>),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("record not found")]
    NotFound,
    #[error("record already exists")]
    AlreadyExists,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unknown token type: {0}")]
    UnknownTokenType(String),
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Serialization(err.to_string())
    }
}

/// Struct representing an OAuth2 error response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct OAuthErrorResponse {
    /// A single ASCII error code from a defined set.
    pub error: String,

    /// Human-readable text providing additional information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// A URI identifying a human-readable web page with information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_uri: Option<String>,
}

impl OAuthErrorResponse {
    /// Helper function to create a new OAuthErrorResponse.
    pub fn new(error: &str, description: Option<&str>, uri: Option<&str>) -> Self {
        OAuthErrorResponse {
            error: error.to_string(),
            error_description: description.map(|s| s.to_string()),
            error_uri: uri.map(|s| s.to_string()),
        }
    }
}

// A failed read or write is always the server's fault from the client's
// point of view, so every variant maps to `server_error`.
impl From<PersistenceError> for OAuthErrorResponse {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::NotFound => OAuthErrorResponse::new(
                "server_error",
                Some("The requested record could not be found."),
                None,
            ),
            PersistenceError::InvalidChangeset(_) => OAuthErrorResponse::new(
                "server_error",
                Some("The record could not be prepared for storage."),
                None,
            ),
            PersistenceError::KeyUnavailable
            | PersistenceError::InvalidKey(_)
            | PersistenceError::Encryption(_)
            | PersistenceError::Decryption(_)
            | PersistenceError::Digest(_) => OAuthErrorResponse::new(
                "server_error",
                Some("The authorization server could not process stored credentials."),
                None,
            ),
            other => OAuthErrorResponse::new("server_error", Some(&other.to_string()), None),
        }
    }
}
