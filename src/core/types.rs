use crate::error::PersistenceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tag distinguishing the kinds of credential stored as token records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    AccessToken,
    RefreshToken,
    AgentToken,
    Code,
    PreauthorizedCode,
}

impl TokenType {
    pub const ALL: [TokenType; 5] = [
        TokenType::AccessToken,
        TokenType::RefreshToken,
        TokenType::AgentToken,
        TokenType::Code,
        TokenType::PreauthorizedCode,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::AccessToken => "access_token",
            TokenType::RefreshToken => "refresh_token",
            TokenType::AgentToken => "agent_token",
            TokenType::Code => "code",
            TokenType::PreauthorizedCode => "preauthorized_code",
        }
    }

    /// Parses a comma separated list such as `access_token,code`.
    pub fn parse_list(list: &str) -> Result<Vec<TokenType>, PersistenceError> {
        list.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(TokenType::from_str)
            .collect()
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenType {
    type Err = PersistenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenType::ALL
            .into_iter()
            .find(|token_type| token_type.as_str() == s)
            .ok_or_else(|| PersistenceError::UnknownTokenType(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_type_names_match_serde() {
        for token_type in TokenType::ALL {
            let json = serde_json::to_value(token_type).unwrap();
            assert_eq!(json, token_type.as_str());
            assert_eq!(token_type.as_str().parse::<TokenType>().unwrap(), token_type);
        }
    }

    #[test]
    fn test_unknown_token_type() {
        assert_eq!(
            "id_token".parse::<TokenType>(),
            Err(PersistenceError::UnknownTokenType("id_token".to_string()))
        );
    }

    #[test]
    fn test_parse_list_ignores_blanks() {
        let types = TokenType::parse_list(" access_token, ,code,").unwrap();
        assert_eq!(types, vec![TokenType::AccessToken, TokenType::Code]);
        assert!(TokenType::parse_list("access_token,bogus").is_err());
    }
}
