use super::ClientPersistence;
use crate::core::{Changeset, Client, ClientField};
use crate::error::PersistenceError;
use crate::security::{is_encrypted, FieldCipher};

const ENCRYPTED_FIELDS: [ClientField; 2] = [ClientField::Secret, ClientField::PrivateKey];

/// Encrypts client secrets and private keys at rest with AES-256-GCM.
///
/// Values read back without the ciphertext prefix were written before
/// encryption was enabled and are returned as they are.
#[derive(Debug, Clone)]
pub struct EncryptedClientPersistence {
    cipher: Option<FieldCipher>,
}

impl EncryptedClientPersistence {
    pub fn new(cipher: FieldCipher) -> Self {
        EncryptedClientPersistence {
            cipher: Some(cipher),
        }
    }

    /// Hooks whose key is not available: every write of a secret is
    /// rejected and every encrypted read fails.
    pub fn without_key() -> Self {
        EncryptedClientPersistence { cipher: None }
    }

    fn decrypt_field(
        &self,
        field: ClientField,
        value: Option<String>,
    ) -> Result<Option<String>, PersistenceError> {
        match value {
            Some(stored) if is_encrypted(&stored) => {
                let cipher = self.cipher.as_ref().ok_or(PersistenceError::KeyUnavailable)?;
                cipher.decrypt(&stored).map(Some)
            }
            Some(legacy) => {
                log::warn!("client {:?} read as plaintext", field);
                Ok(Some(legacy))
            }
            None => Ok(None),
        }
    }
}

impl ClientPersistence for EncryptedClientPersistence {
    fn dump(&self, changeset: Changeset<Client>) -> Changeset<Client> {
        let changeset = ENCRYPTED_FIELDS.iter().fold(changeset, |changeset, &field| {
            changeset.update_string_change(field, |plaintext| match &self.cipher {
                Some(cipher) => cipher.encrypt(plaintext),
                None => Err(PersistenceError::KeyUnavailable),
            })
        });

        if !changeset.is_valid() {
            log::warn!(
                "client {} changeset rejected: {} field(s) could not be encrypted",
                changeset.data().id,
                changeset.errors().len()
            );
        }
        changeset
    }

    fn load(&self, mut client: Client) -> Result<Client, PersistenceError> {
        client.secret = self.decrypt_field(ClientField::Secret, client.secret.take())?;
        client.private_key =
            self.decrypt_field(ClientField::PrivateKey, client.private_key.take())?;
        Ok(client)
    }
}
