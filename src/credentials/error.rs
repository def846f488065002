// Signet — Credential error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("keyed generator failed: {0}")]
    Keyed(String),

    #[error("malformed certificate: {0}")]
    Pem(String),
}
