//! Persistence hooks for the rustify-auth authorization server.
//!
//! Clients and tokens pass through a pair of configurable hooks on their way
//! to and from storage: `dump` before a write, `load` after a read, and for
//! tokens `dump_value` before a lookup by raw value. The defaults are the
//! identity; [`persistence::EncryptedClientPersistence`] and
//! [`persistence::HashedTokenPersistence`] are ready-made alternatives.

use crate::config::PersistenceConfig;
use crate::error::PersistenceError;
use crate::persistence::Persistence;
use crate::storage::{ClientRepository, MemoryStorage, TokenRepository};
use std::sync::Arc;

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod security;
pub mod storage;

pub use crate::core::{Changeset, Client, ClientField, Token, TokenField, TokenType};
pub use crate::persistence::{ClientPersistence, IdentityPersistence, TokenPersistence};

/// Loads the hook selection from the environment.
pub fn persistence_from_env() -> Result<Persistence, PersistenceError> {
    let config = PersistenceConfig::from_env()?;
    Persistence::from_config(&config)
}

/// Client and token repositories sharing one in-memory store.
pub fn create_memory_repositories(
    persistence: &Persistence,
) -> (
    ClientRepository<MemoryStorage>,
    TokenRepository<MemoryStorage>,
) {
    let storage = Arc::new(MemoryStorage::new());
    (
        ClientRepository::new(storage.clone(), persistence.clients.clone()),
        TokenRepository::new(storage, persistence.tokens.clone()),
    )
}
