use super::TokenStore;
use crate::core::{Changeset, Token, TokenField, TokenType};
use crate::error::PersistenceError;
use crate::persistence::TokenPersistence;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Token persistence as seen by the OAuth core.
///
/// Lookups by raw value run the value through `dump_value` before querying,
/// so they find tokens whose values were hashed on write.
pub struct TokenRepository<S: TokenStore> {
    store: Arc<S>,
    hooks: Arc<dyn TokenPersistence>,
}

impl<S: TokenStore> Clone for TokenRepository<S> {
    fn clone(&self) -> Self {
        TokenRepository {
            store: Arc::clone(&self.store),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<S: TokenStore> TokenRepository<S> {
    pub fn new(store: Arc<S>, hooks: Arc<dyn TokenPersistence>) -> Self {
        TokenRepository { store, hooks }
    }

    /// Persists a newly issued token. Every populated field counts as
    /// changed, so a value already set on the record is still dumped.
    pub async fn create(&self, changeset: Changeset<Token>) -> Result<Token, PersistenceError> {
        let token = self.prepare(changeset.into_insert())?;
        log::debug!("inserting {} {}", token.token_type, token.id);
        self.store.insert_token(token.clone()).await?;
        self.hooks.load(token)
    }

    /// Stages the changes over the stored record and writes the result.
    pub async fn update(&self, changeset: Changeset<Token>) -> Result<Token, PersistenceError> {
        let id = changeset.data().id;
        let stored = self
            .store
            .get_token(id)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        let token = self.prepare(changeset.rebase(stored))?;
        log::debug!("updating {} {}", token.token_type, id);
        self.store.update_token(token.clone()).await?;
        self.hooks.load(token)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Token>, PersistenceError> {
        let token = self.store.get_token(id).await?;
        self.load_optional(token)
    }

    /// Finds a token of `token_type` by the value the client presented.
    pub async fn get_by_value(
        &self,
        value: &str,
        token_type: TokenType,
    ) -> Result<Option<Token>, PersistenceError> {
        let stored_value = self.hooks.dump_value(value, token_type)?;
        let token = self
            .store
            .find_token_by_value(&stored_value, token_type)
            .await?;
        if token.is_none() {
            log::debug!("no {} matches the presented value", token_type);
        }
        self.load_optional(token)
    }

    pub async fn get_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<Token>, PersistenceError> {
        let stored_value = self
            .hooks
            .dump_value(refresh_token, TokenType::RefreshToken)?;
        let token = self.store.find_token_by_refresh_token(&stored_value).await?;
        self.load_optional(token)
    }

    /// Marks a token as revoked. Revoking twice keeps the first timestamp.
    pub async fn revoke(&self, id: Uuid) -> Result<Token, PersistenceError> {
        let token = self
            .store
            .get_token(id)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        if token.is_revoked() {
            return self.hooks.load(token);
        }
        self.update(Changeset::new(token).put_change(TokenField::RevokedAt, json!(Utc::now())))
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        log::debug!("deleting token {}", id);
        self.store.delete_token(id).await
    }

    fn prepare(&self, changeset: Changeset<Token>) -> Result<Token, PersistenceError> {
        let id = changeset.data().id;
        self.hooks.dump(changeset).apply().map_err(|err| {
            log::warn!("token {} not written: {}", id, err);
            err
        })
    }

    fn load_optional(&self, token: Option<Token>) -> Result<Option<Token>, PersistenceError> {
        token.map(|token| self.hooks.load(token)).transpose()
    }
}
