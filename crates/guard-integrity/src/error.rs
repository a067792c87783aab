//! Error types for conversation signing and verification.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IntegrityError>;

#[derive(Debug, Error)]
pub enum IntegrityError {
    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("invalid HMAC key length")]
    InvalidKeyLength,
}
