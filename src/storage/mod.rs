pub mod client;
pub mod memory;
pub mod token;

use crate::core::{Client, Token, TokenType};
use crate::error::PersistenceError;
use async_trait::async_trait;
use uuid::Uuid;

pub use client::ClientRepository;
pub use memory::MemoryStorage;
pub use token::TokenRepository;

/// Raw client storage. Records go in and come out exactly as the persistence
/// hooks left them; stores never transform fields themselves.
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Inserts a new client, failing with `AlreadyExists` on a duplicate id.
    async fn insert_client(&self, client: Client) -> Result<(), PersistenceError>;
    /// Replaces an existing client, failing with `NotFound` if there is none.
    async fn update_client(&self, client: Client) -> Result<(), PersistenceError>;
    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, PersistenceError>;
    async fn list_clients(&self) -> Result<Vec<Client>, PersistenceError>;
    async fn delete_client(&self, id: Uuid) -> Result<(), PersistenceError>;
}

/// Raw token storage. Lookups by value compare against the stored (dumped)
/// form, so callers must transform the search key first.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert_token(&self, token: Token) -> Result<(), PersistenceError>;
    async fn update_token(&self, token: Token) -> Result<(), PersistenceError>;
    async fn get_token(&self, id: Uuid) -> Result<Option<Token>, PersistenceError>;
    async fn find_token_by_value(
        &self,
        value: &str,
        token_type: TokenType,
    ) -> Result<Option<Token>, PersistenceError>;
    async fn find_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, PersistenceError>;
    async fn delete_token(&self, id: Uuid) -> Result<(), PersistenceError>;
}
