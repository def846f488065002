// Signet — Library root
//
// Transactional identity and credential directory: stores user and group
// principals with their authentication material, and resolves certificates
// back to owning principals with ambiguity detection. Consumed as a library
// by an authentication layer; owns no wire protocol.

pub mod credentials;
pub mod directory;
pub mod error;
pub mod store;

pub use credentials::{Certificate, CredentialGenerator, HmacCredentialGenerator};
pub use directory::{DatabaseDirectory, Group, GroupDirectory, User, UserDirectory};
pub use error::{DirectoryError, Result};
pub use store::Database;
