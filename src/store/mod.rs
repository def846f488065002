// Signet — Store Module
//
// Relational store adapter over SQLite. Exposes a query-by-example surface:
// populated fields of a template become exact-equality predicates, compiled
// into SQL. Every mutation runs inside an explicit transaction scope that is
// committed or rolled back before the operation returns.

mod adapter;
mod db;
mod error;
mod example;

pub use adapter::{ReadSession, Related, TxScope};
pub use db::Database;
pub use error::StoreError;
pub use example::{Entity, Example, IntoValue};
