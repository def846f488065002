// Signet — Store error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("expected exactly one row in {table}, found {count}")]
    NotUnique { table: &'static str, count: usize },
}

impl StoreError {
    /// Row count for a failed unique query, if that is what went wrong.
    pub fn match_count(&self) -> Option<usize> {
        match self {
            StoreError::NotUnique { count, .. } => Some(*count),
            StoreError::Database(_) => None,
        }
    }

    /// Whether the underlying fault is a schema constraint violation, as
    /// opposed to a transport or storage fault.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            StoreError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation
        )
    }
}
