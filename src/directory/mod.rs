// Signet — Directory Module
//
// Principal repository, certificate matcher, and group membership resolver.
// One database-backed implementation satisfies both capability traits.

mod certificates;
mod membership;
mod models;
mod repository;

pub use models::{Confirmation, Group, GroupMember, HistoricalCertificate, User};
pub use repository::{DatabaseDirectory, GroupDirectory, UserDirectory};
