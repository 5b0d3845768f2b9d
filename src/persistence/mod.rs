//! Persistence hooks.
//!
//! The authorization server calls a hook right before a client or token is
//! written and right after one is read back. Hosts use them to hash or
//! encrypt sensitive fields; the default [`IdentityPersistence`] leaves
//! everything as is, so transformation is strictly opt-in.
//!
//! Hooks must be safe to call from many requests at once and must not do
//! I/O: they run on the hot path of every read and write.

pub mod consistency;
pub mod encrypted;
pub mod hashed;

use crate::config::{ClientPersistenceKind, PersistenceConfig, TokenPersistenceKind};
use crate::core::{Changeset, Client, Token, TokenType};
use crate::error::PersistenceError;
use crate::security::{FieldCipher, TokenDigest};
use std::sync::Arc;

pub use encrypted::EncryptedClientPersistence;
pub use hashed::HashedTokenPersistence;

/// Transformation of client records at the storage boundary.
pub trait ClientPersistence: Send + Sync {
    /// Called before a client changeset is written.
    ///
    /// Only fields present in the changes may be rewritten. A transformation
    /// failure must be reported with [`Changeset::add_error`], which aborts
    /// the write.
    fn dump(&self, changeset: Changeset<Client>) -> Changeset<Client>;

    /// Called on every client read from storage.
    fn load(&self, client: Client) -> Result<Client, PersistenceError>;
}

/// Transformation of token records at the storage boundary.
pub trait TokenPersistence: Send + Sync {
    /// Transforms a raw token value before it is used to query storage.
    ///
    /// Must be deterministic and must agree with what [`Self::dump`] stores
    /// for the same value and type; otherwise stored tokens can no longer be
    /// found.
    fn dump_value(&self, value: &str, token_type: TokenType) -> Result<String, PersistenceError>;

    /// Called before a token changeset is written.
    fn dump(&self, changeset: Changeset<Token>) -> Changeset<Token>;

    /// Called on every token read from storage.
    fn load(&self, token: Token) -> Result<Token, PersistenceError>;
}

/// The default hooks: every operation is the identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPersistence;

impl ClientPersistence for IdentityPersistence {
    fn dump(&self, changeset: Changeset<Client>) -> Changeset<Client> {
        changeset
    }

    fn load(&self, client: Client) -> Result<Client, PersistenceError> {
        Ok(client)
    }
}

impl TokenPersistence for IdentityPersistence {
    fn dump_value(&self, value: &str, _token_type: TokenType) -> Result<String, PersistenceError> {
        Ok(value.to_string())
    }

    fn dump(&self, changeset: Changeset<Token>) -> Changeset<Token> {
        changeset
    }

    fn load(&self, token: Token) -> Result<Token, PersistenceError> {
        Ok(token)
    }
}

/// The pair of hooks a deployment runs with.
#[derive(Clone)]
pub struct Persistence {
    pub clients: Arc<dyn ClientPersistence>,
    pub tokens: Arc<dyn TokenPersistence>,
}

impl Default for Persistence {
    fn default() -> Self {
        Persistence {
            clients: Arc::new(IdentityPersistence),
            tokens: Arc::new(IdentityPersistence),
        }
    }
}

impl Persistence {
    pub fn new(clients: Arc<dyn ClientPersistence>, tokens: Arc<dyn TokenPersistence>) -> Self {
        Persistence { clients, tokens }
    }

    /// Selects the hooks named by `config`. Key material is parsed here, so a
    /// malformed key fails at start-up rather than on the first request.
    pub fn from_config(config: &PersistenceConfig) -> Result<Self, PersistenceError> {
        let clients: Arc<dyn ClientPersistence> = match config.client_persistence {
            ClientPersistenceKind::Identity => Arc::new(IdentityPersistence),
            ClientPersistenceKind::Encrypted => match &config.client_encryption_key {
                Some(key) => Arc::new(EncryptedClientPersistence::new(FieldCipher::from_hex(key)?)),
                None => {
                    log::warn!("client encryption enabled without a key; client secrets cannot be written");
                    Arc::new(EncryptedClientPersistence::without_key())
                }
            },
        };

        let tokens: Arc<dyn TokenPersistence> = match config.token_persistence {
            TokenPersistenceKind::Identity => Arc::new(IdentityPersistence),
            TokenPersistenceKind::Hashed => {
                let digest = match &config.token_hash_pepper {
                    Some(pepper) => TokenDigest::with_pepper(pepper),
                    None => TokenDigest::Sha256,
                };
                let mut hooks = HashedTokenPersistence::new(digest);
                if let Some(types) = &config.hashed_token_types {
                    hooks = hooks.with_types(types);
                }
                if let Some(key) = &config.token_metadata_key {
                    hooks = hooks.with_metadata_cipher(FieldCipher::from_hex(key)?);
                }
                Arc::new(hooks)
            }
        };

        log::info!(
            "persistence hooks selected: clients={:?}, tokens={:?}",
            config.client_persistence,
            config.token_persistence
        );
        Ok(Persistence { clients, tokens })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClientField, TokenField};
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_identity_client_hooks() {
        let mut client = Client::new("app");
        client.secret = Some("s3cr3t".to_string());
        let changeset =
            Changeset::new(client.clone()).put_change(ClientField::PrivateKey, "pem");

        let dumped = ClientPersistence::dump(&IdentityPersistence, changeset.clone());
        assert_eq!(dumped, changeset);
        assert_eq!(
            ClientPersistence::load(&IdentityPersistence, client.clone()).unwrap(),
            client
        );
    }

    #[test]
    fn test_identity_token_hooks() {
        let token = Token::new(TokenType::Code, Uuid::new_v4(), "code", 0);
        let changeset = Changeset::new(token.clone()).put_change(TokenField::Value, json!(""));

        for token_type in TokenType::ALL {
            assert_eq!(
                TokenPersistence::dump_value(&IdentityPersistence, "raw", token_type).unwrap(),
                "raw"
            );
        }
        assert_eq!(TokenPersistence::dump(&IdentityPersistence, changeset.clone()), changeset);
        assert_eq!(TokenPersistence::load(&IdentityPersistence, token.clone()).unwrap(), token);
    }

    #[test]
    fn test_from_default_config_is_identity() {
        let persistence = Persistence::from_config(&PersistenceConfig::default()).unwrap();
        assert_eq!(
            persistence
                .tokens
                .dump_value("abc", TokenType::AccessToken)
                .unwrap(),
            "abc"
        );
    }

    #[test]
    fn test_from_config_rejects_bad_key() {
        let config = PersistenceConfig {
            client_persistence: ClientPersistenceKind::Encrypted,
            client_encryption_key: Some("short".to_string()),
            ..PersistenceConfig::default()
        };
        assert!(matches!(
            Persistence::from_config(&config),
            Err(PersistenceError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_from_config_hashes_selected_types() {
        let config = PersistenceConfig {
            token_persistence: TokenPersistenceKind::Hashed,
            hashed_token_types: Some(vec![TokenType::Code]),
            ..PersistenceConfig::default()
        };
        let persistence = Persistence::from_config(&config).unwrap();
        assert_ne!(persistence.tokens.dump_value("abc", TokenType::Code).unwrap(), "abc");
        assert_eq!(
            persistence
                .tokens
                .dump_value("abc", TokenType::AccessToken)
                .unwrap(),
            "abc"
        );
    }
}
