use crate::core::changeset::{Field, Schema};
use crate::core::types::TokenType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An issued credential as persisted by the authorization server.
///
/// Rotation creates a new record; `previous_code` links a token back to the
/// code it was exchanged for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub value: String,
    pub refresh_token: Option<String>,
    pub client_id: Uuid,
    pub sub: Option<String>,
    pub scope: Option<String>,
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
    pub nonce: Option<String>,
    pub code_challenge: Option<String>,
    pub previous_code: Option<String>,
    /// Expiration as a unix timestamp in seconds.
    pub expires_at: i64,
    pub revoked_at: Option<DateTime<Utc>>,
    pub inserted_at: DateTime<Utc>,
}

impl Token {
    pub fn new(token_type: TokenType, client_id: Uuid, value: &str, expires_at: i64) -> Self {
        Token {
            id: Uuid::new_v4(),
            token_type,
            value: value.to_string(),
            refresh_token: None,
            client_id,
            sub: None,
            scope: None,
            redirect_uri: None,
            state: None,
            nonce: None,
            code_challenge: None,
            previous_code: None,
            expires_at,
            revoked_at: None,
            inserted_at: Utc::now(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TokenField {
    TokenType,
    Value,
    RefreshToken,
    Sub,
    Scope,
    RedirectUri,
    State,
    Nonce,
    CodeChallenge,
    PreviousCode,
    ExpiresAt,
    RevokedAt,
}

impl Field for TokenField {
    fn name(self) -> &'static str {
        match self {
            TokenField::TokenType => "type",
            TokenField::Value => "value",
            TokenField::RefreshToken => "refresh_token",
            TokenField::Sub => "sub",
            TokenField::Scope => "scope",
            TokenField::RedirectUri => "redirect_uri",
            TokenField::State => "state",
            TokenField::Nonce => "nonce",
            TokenField::CodeChallenge => "code_challenge",
            TokenField::PreviousCode => "previous_code",
            TokenField::ExpiresAt => "expires_at",
            TokenField::RevokedAt => "revoked_at",
        }
    }
}

impl Schema for Token {
    type Field = TokenField;
    const FIELDS: &'static [TokenField] = &[
        TokenField::TokenType,
        TokenField::Value,
        TokenField::RefreshToken,
        TokenField::Sub,
        TokenField::Scope,
        TokenField::RedirectUri,
        TokenField::State,
        TokenField::Nonce,
        TokenField::CodeChallenge,
        TokenField::PreviousCode,
        TokenField::ExpiresAt,
        TokenField::RevokedAt,
    ];
}
