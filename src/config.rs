// src/config.rs
use crate::core::TokenType;
use crate::error::PersistenceError;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ClientPersistenceKind {
    #[default]
    Identity,
    Encrypted,
}

impl FromStr for ClientPersistenceKind {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "identity" => Ok(ClientPersistenceKind::Identity),
            "encrypted" => Ok(ClientPersistenceKind::Encrypted),
            other => Err(PersistenceError::Config(format!(
                "unknown client persistence '{}'",
                other
            ))),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TokenPersistenceKind {
    #[default]
    Identity,
    Hashed,
}

impl FromStr for TokenPersistenceKind {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "identity" => Ok(TokenPersistenceKind::Identity),
            "hashed" => Ok(TokenPersistenceKind::Hashed),
            other => Err(PersistenceError::Config(format!(
                "unknown token persistence '{}'",
                other
            ))),
        }
    }
}

/// Which persistence hooks a deployment runs with, and their key material.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    pub client_persistence: ClientPersistenceKind,
    /// AES-256 key as 64 hex characters.
    pub client_encryption_key: Option<String>,
    pub token_persistence: TokenPersistenceKind,
    /// HMAC key for token digests; plain SHA-256 when absent.
    pub token_hash_pepper: Option<String>,
    /// Token types to hash; all types when absent.
    pub hashed_token_types: Option<Vec<TokenType>>,
    /// AES-256 key used to encrypt token `state` and `nonce`.
    pub token_metadata_key: Option<String>,
}

impl PersistenceConfig {
    /// Reads the configuration from the process environment, loading a
    /// `.env` file first if there is one.
    pub fn from_env() -> Result<Self, PersistenceError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PersistenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let client_persistence = var("CLIENT_PERSISTENCE")
            .map(|value| value.parse::<ClientPersistenceKind>())
            .transpose()?
            .unwrap_or_default();
        let token_persistence = var("TOKEN_PERSISTENCE")
            .map(|value| value.parse::<TokenPersistenceKind>())
            .transpose()?
            .unwrap_or_default();
        let hashed_token_types = var("TOKEN_HASHED_TYPES")
            .map(|value| TokenType::parse_list(&value))
            .transpose()?;

        Ok(PersistenceConfig {
            client_persistence,
            client_encryption_key: var("CLIENT_ENCRYPTION_KEY"),
            token_persistence,
            token_hash_pepper: var("TOKEN_HASH_PEPPER"),
            hashed_token_types,
            token_metadata_key: var("TOKEN_METADATA_KEY"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_to_identity() {
        let config = PersistenceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PersistenceConfig::default());
        assert_eq!(config.client_persistence, ClientPersistenceKind::Identity);
        assert_eq!(config.token_persistence, TokenPersistenceKind::Identity);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = PersistenceConfig::from_lookup(lookup(&[
            ("CLIENT_PERSISTENCE", "encrypted"),
            ("CLIENT_ENCRYPTION_KEY", "abcd"),
            ("TOKEN_PERSISTENCE", "hashed"),
            ("TOKEN_HASH_PEPPER", "pepper"),
            ("TOKEN_HASHED_TYPES", "access_token,refresh_token"),
            ("TOKEN_METADATA_KEY", ""),
        ]))
        .unwrap();

        assert_eq!(config.client_persistence, ClientPersistenceKind::Encrypted);
        assert_eq!(config.client_encryption_key.as_deref(), Some("abcd"));
        assert_eq!(config.token_persistence, TokenPersistenceKind::Hashed);
        assert_eq!(config.token_hash_pepper.as_deref(), Some("pepper"));
        assert_eq!(
            config.hashed_token_types,
            Some(vec![TokenType::AccessToken, TokenType::RefreshToken])
        );
        assert_eq!(config.token_metadata_key, None);
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let result = PersistenceConfig::from_lookup(lookup(&[("TOKEN_PERSISTENCE", "encrypted")]));
        assert!(matches!(result, Err(PersistenceError::Config(_))));
    }

    #[test]
    fn test_deserializes_from_host_config() {
        let config: PersistenceConfig = serde_json::from_str(
            r#"{"token_persistence": "hashed", "hashed_token_types": ["code"]}"#,
        )
        .unwrap();
        assert_eq!(config.token_persistence, TokenPersistenceKind::Hashed);
        assert_eq!(config.hashed_token_types, Some(vec![TokenType::Code]));
        assert_eq!(config.client_persistence, ClientPersistenceKind::Identity);
    }
}
