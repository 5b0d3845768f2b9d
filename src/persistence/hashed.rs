use super::TokenPersistence;
use crate::core::{Changeset, Token, TokenField, TokenType};
use crate::error::PersistenceError;
use crate::security::{is_encrypted, FieldCipher, TokenDigest};
use std::collections::BTreeSet;

/// Fields that can be searched by raw value, with the token type their
/// lookups use. `None` stands for the record's own type.
const SEARCHABLE_FIELDS: [(TokenField, Option<TokenType>); 3] = [
    (TokenField::Value, None),
    (TokenField::RefreshToken, Some(TokenType::RefreshToken)),
    (TokenField::PreviousCode, Some(TokenType::Code)),
];

const METADATA_FIELDS: [TokenField; 2] = [TokenField::State, TokenField::Nonce];

/// Stores token values as one-way digests.
///
/// Loading cannot recover a hashed value, so `load` is the identity on
/// searchable fields. An optional metadata cipher encrypts `state` and
/// `nonce`, which are restored on load.
#[derive(Debug, Clone)]
pub struct HashedTokenPersistence {
    digest: TokenDigest,
    hashed_types: BTreeSet<TokenType>,
    metadata_cipher: Option<FieldCipher>,
}

impl HashedTokenPersistence {
    /// Hashes every token type.
    pub fn new(digest: TokenDigest) -> Self {
        HashedTokenPersistence {
            digest,
            hashed_types: TokenType::ALL.into_iter().collect(),
            metadata_cipher: None,
        }
    }

    /// Restricts hashing to `types`; values of other types are stored verbatim.
    pub fn with_types(mut self, types: &[TokenType]) -> Self {
        self.hashed_types = types.iter().copied().collect();
        self
    }

    pub fn with_metadata_cipher(mut self, cipher: FieldCipher) -> Self {
        self.metadata_cipher = Some(cipher);
        self
    }

    pub fn hashes(&self, token_type: TokenType) -> bool {
        self.hashed_types.contains(&token_type)
    }

    fn decrypt_metadata(&self, value: Option<String>) -> Result<Option<String>, PersistenceError> {
        match value {
            Some(stored) if is_encrypted(&stored) => {
                let cipher = self
                    .metadata_cipher
                    .as_ref()
                    .ok_or(PersistenceError::KeyUnavailable)?;
                cipher.decrypt(&stored).map(Some)
            }
            other => Ok(other),
        }
    }
}

impl TokenPersistence for HashedTokenPersistence {
    fn dump_value(&self, value: &str, token_type: TokenType) -> Result<String, PersistenceError> {
        if self.hashes(token_type) {
            self.digest.hash(value)
        } else {
            Ok(value.to_string())
        }
    }

    fn dump(&self, changeset: Changeset<Token>) -> Changeset<Token> {
        let record_type = match changeset
            .get_field(TokenField::TokenType)
            .map(serde_json::from_value::<TokenType>)
        {
            Some(Ok(token_type)) => token_type,
            _ => return changeset.add_error(TokenField::TokenType, "unknown token type"),
        };

        // A stored digest cannot be re-derived under another type's policy.
        let stored_type = changeset.data().token_type;
        if self.hashes(record_type) != self.hashes(stored_type)
            && !changeset.is_changed(TokenField::Value)
        {
            return changeset.add_error(
                TokenField::TokenType,
                "type change requires a new value under this hashing policy",
            );
        }

        let changeset = SEARCHABLE_FIELDS
            .iter()
            .fold(changeset, |changeset, &(field, lookup_type)| {
                let token_type = lookup_type.unwrap_or(record_type);
                changeset.update_string_change(field, |raw| self.dump_value(raw, token_type))
            });

        match &self.metadata_cipher {
            Some(cipher) => METADATA_FIELDS.iter().fold(changeset, |changeset, &field| {
                changeset.update_string_change(field, |plaintext| cipher.encrypt(plaintext))
            }),
            None => changeset,
        }
    }

    fn load(&self, mut token: Token) -> Result<Token, PersistenceError> {
        token.state = self.decrypt_metadata(token.state.take())?;
        token.nonce = self.decrypt_metadata(token.nonce.take())?;
        Ok(token)
    }
}
