use crate::core::changeset::{Field, Schema};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An OAuth client as persisted by the authorization server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub secret: Option<String>,
    pub private_key: Option<String>,
    pub public_key: Option<String>,
    pub redirect_uris: Vec<String>,
    pub authorized_scopes: Vec<String>,
    pub confidential: bool,
    /// Access token lifetime in seconds.
    pub access_token_ttl: i64,
    pub inserted_at: DateTime<Utc>,
}

impl Client {
    /// A blank client with a fresh id, ready to be filled by a changeset.
    pub fn new(name: &str) -> Self {
        Client {
            id: Uuid::new_v4(),
            name: name.to_string(),
            secret: None,
            private_key: None,
            public_key: None,
            redirect_uris: Vec::new(),
            authorized_scopes: Vec::new(),
            confidential: false,
            access_token_ttl: 3600,
            inserted_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientField {
    Name,
    Secret,
    PrivateKey,
    PublicKey,
    RedirectUris,
    AuthorizedScopes,
    Confidential,
    AccessTokenTtl,
}

impl Field for ClientField {
    fn name(self) -> &'static str {
        match self {
            ClientField::Name => "name",
            ClientField::Secret => "secret",
            ClientField::PrivateKey => "private_key",
            ClientField::PublicKey => "public_key",
            ClientField::RedirectUris => "redirect_uris",
            ClientField::AuthorizedScopes => "authorized_scopes",
            ClientField::Confidential => "confidential",
            ClientField::AccessTokenTtl => "access_token_ttl",
        }
    }
}

impl Schema for Client {
    type Field = ClientField;
    const FIELDS: &'static [ClientField] = &[
        ClientField::Name,
        ClientField::Secret,
        ClientField::PrivateKey,
        ClientField::PublicKey,
        ClientField::RedirectUris,
        ClientField::AuthorizedScopes,
        ClientField::Confidential,
        ClientField::AccessTokenTtl,
    ];
}
