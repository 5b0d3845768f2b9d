use super::{ClientStore, TokenStore};
use crate::core::{Client, Token, TokenType};
use crate::error::PersistenceError;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

/// A simple in-memory storage backend for tests and single-process
/// deployments.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    clients: DashMap<Uuid, Client>,
    tokens: DashMap<Uuid, Token>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            clients: DashMap::new(),
            tokens: DashMap::new(),
        }
    }
}

fn insert_new<V>(map: &DashMap<Uuid, V>, id: Uuid, record: V) -> Result<(), PersistenceError> {
    match map.entry(id) {
        Entry::Occupied(_) => Err(PersistenceError::AlreadyExists),
        Entry::Vacant(slot) => {
            slot.insert(record);
            Ok(())
        }
    }
}

fn replace<V>(map: &DashMap<Uuid, V>, id: Uuid, record: V) -> Result<(), PersistenceError> {
    match map.get_mut(&id) {
        Some(mut existing) => {
            *existing = record;
            Ok(())
        }
        None => Err(PersistenceError::NotFound),
    }
}

#[async_trait]
impl ClientStore for MemoryStorage {
    async fn insert_client(&self, client: Client) -> Result<(), PersistenceError> {
        insert_new(&self.clients, client.id, client)
    }

    async fn update_client(&self, client: Client) -> Result<(), PersistenceError> {
        replace(&self.clients, client.id, client)
    }

    async fn get_client(&self, id: Uuid) -> Result<Option<Client>, PersistenceError> {
        Ok(self.clients.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_clients(&self) -> Result<Vec<Client>, PersistenceError> {
        let mut clients: Vec<Client> = self
            .clients
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        clients.sort_by(|a, b| a.inserted_at.cmp(&b.inserted_at).then(a.id.cmp(&b.id)));
        Ok(clients)
    }

    async fn delete_client(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.clients
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound)
    }
}

#[async_trait]
impl TokenStore for MemoryStorage {
    async fn insert_token(&self, token: Token) -> Result<(), PersistenceError> {
        insert_new(&self.tokens, token.id, token)
    }

    async fn update_token(&self, token: Token) -> Result<(), PersistenceError> {
        replace(&self.tokens, token.id, token)
    }

    async fn get_token(&self, id: Uuid) -> Result<Option<Token>, PersistenceError> {
        Ok(self.tokens.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_token_by_value(
        &self,
        value: &str,
        token_type: TokenType,
    ) -> Result<Option<Token>, PersistenceError> {
        Ok(self
            .tokens
            .iter()
            .find(|entry| {
                let token = entry.value();
                token.token_type == token_type && token.value == value
            })
            .map(|entry| entry.value().clone()))
    }

    async fn find_token_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, PersistenceError> {
        Ok(self
            .tokens
            .iter()
            .find(|entry| entry.value().refresh_token.as_deref() == Some(refresh_token))
            .map(|entry| entry.value().clone()))
    }

    async fn delete_token(&self, id: Uuid) -> Result<(), PersistenceError> {
        self.tokens
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound)
    }
}
