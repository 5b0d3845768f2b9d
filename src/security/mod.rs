pub mod digest;
pub mod encryption;

pub use digest::TokenDigest;
pub use encryption::{is_encrypted, FieldCipher};
