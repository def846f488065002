// Signet — Top-level error types
//
// Classifies directory failures for callers: a missing principal, a losing
// create race, an ambiguous certificate match, or an underlying store fault.
// Ambiguity is deliberately a distinct kind from NotFound so an
// authentication layer can refuse differently.

use thiserror::Error;

use crate::credentials::CredentialError;
use crate::store::StoreError;

/// Classified failure of a directory operation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("no such principal: {0}")]
    NotFound(String),

    #[error("principal already exists: {0}")]
    Conflict(String),

    #[error("certificate matched {count} users: {subject}")]
    Ambiguous { count: usize, subject: String },

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
