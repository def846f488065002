// Signet — Credentials Module
//
// Generates the authentication material attached to a principal (query id,
// secret key, session token, hashed password) and transcodes certificates to
// the canonical text form the matcher compares against.

mod codec;
mod error;
mod generator;

pub use codec::{Certificate, CertificateData};
pub use error::CredentialError;
pub use generator::{CredentialGenerator, HmacCredentialGenerator};
