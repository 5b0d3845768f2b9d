pub mod changeset;
pub mod client;
pub mod token;
pub mod types;

pub use changeset::{Changeset, Field, FieldError, Schema};
pub use client::{Client, ClientField};
pub use token::{Token, TokenField};
pub use types::TokenType;
