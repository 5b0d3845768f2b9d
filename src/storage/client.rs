use super::ClientStore;
use crate::core::{Changeset, Client};
use crate::error::PersistenceError;
use crate::persistence::ClientPersistence;
use std::sync::Arc;
use uuid::Uuid;

/// Client persistence as seen by the OAuth core: every write goes through
/// the configured `dump` hook and every read through `load`.
pub struct ClientRepository<S: ClientStore> {
    store: Arc<S>,
    hooks: Arc<dyn ClientPersistence>,
}

impl<S: ClientStore> Clone for ClientRepository<S> {
    fn clone(&self) -> Self {
        ClientRepository {
            store: Arc::clone(&self.store),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<S: ClientStore> ClientRepository<S> {
    pub fn new(store: Arc<S>, hooks: Arc<dyn ClientPersistence>) -> Self {
        ClientRepository { store, hooks }
    }

    /// Registers a new client. Every populated field counts as changed.
    pub async fn create(&self, changeset: Changeset<Client>) -> Result<Client, PersistenceError> {
        let client = self.prepare(changeset.into_insert())?;
        log::debug!("inserting client {}", client.id);
        self.store.insert_client(client.clone()).await?;
        self.hooks.load(client)
    }

    /// Applies a change to an existing client, e.g. a credential rotation.
    ///
    /// The changes are staged over the stored record, so fields the caller
    /// did not change keep their stored form.
    pub async fn update(&self, changeset: Changeset<Client>) -> Result<Client, PersistenceError> {
        let id = changeset.data().id;
        let stored = self
            .store
            .get_client(id)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        let client = self.prepare(changeset.rebase(stored))?;
        log::debug!("updating client {}", id);
        self.store.update_client(client.clone()).await?;
        self.hooks.load(client)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Client>, PersistenceError> {
        self.store
            .get_client(id)
            .await?
            .map(|client| self.hooks.load(client))
            .transpose()
    }

    pub async fn list(&self) -> Result<Vec<Client>, PersistenceError> {
        self.store
            .list_clients()
            .await?
            .into_iter()
            .map(|client| self.hooks.load(client))
            .collect()
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), PersistenceError> {
        log::debug!("deleting client {}", id);
        self.store.delete_client(id).await
    }

    fn prepare(&self, changeset: Changeset<Client>) -> Result<Client, PersistenceError> {
        let id = changeset.data().id;
        self.hooks.dump(changeset).apply().map_err(|err| {
            log::warn!("client {} not written: {}", id, err);
            err
        })
    }
}
