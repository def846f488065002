// Signet — Transaction scopes and example queries
//
// `TxScope` wraps one SQLite transaction for the exclusive duration of a
// directory operation. A scope that is neither committed nor rolled back is
// rolled back when dropped, so a store fault part-way through a multi-step
// write can never leave a partial result behind.

use rusqlite::{params_from_iter, Connection, Transaction};

use super::example::{Entity, Example};
use super::StoreError;

/// A transaction scope over the directory database.
pub struct TxScope<'a> {
    tx: Transaction<'a>,
}

impl<'a> TxScope<'a> {
    pub(super) fn begin(conn: &'a Connection) -> Result<Self, StoreError> {
        Ok(Self {
            tx: conn.unchecked_transaction()?,
        })
    }

    /// Insert one entity row.
    pub fn insert<E: Entity>(&self, entity: &E) -> Result<(), StoreError> {
        let placeholders: Vec<String> = (1..=E::COLUMNS.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            E::TABLE,
            E::COLUMNS.join(", "),
            placeholders.join(", ")
        );
        self.tx.execute(&sql, params_from_iter(entity.insert_values()))?;
        Ok(())
    }

    /// All rows matching the example.
    pub fn query_all<E: Entity>(&self, example: &Example) -> Result<Vec<E>, StoreError> {
        let (clause, values) = example.where_clause(None, 1);
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            E::COLUMNS.join(", "),
            E::TABLE,
            clause
        );
        let mut stmt = self.tx.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), E::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// The single row matching the example. Zero rows or more than one is a
    /// `NotUnique` failure carrying the observed count.
    pub fn query_unique<E: Entity>(&self, example: &Example) -> Result<E, StoreError> {
        let mut matches = self.query_all::<E>(example)?;
        match matches.len() {
            1 => Ok(matches.remove(0)),
            count => Err(StoreError::NotUnique {
                table: E::TABLE,
                count,
            }),
        }
    }

    /// Delete the single row matching the example, returning it.
    pub fn delete_unique<E: Entity>(&self, example: &Example) -> Result<E, StoreError> {
        let found = self.query_unique::<E>(example)?;
        let (clause, values) = example.where_clause(None, 1);
        let sql = format!("DELETE FROM {} WHERE {}", E::TABLE, clause);
        self.tx.execute(&sql, params_from_iter(values))?;
        Ok(found)
    }

    /// Raw statement escape hatch for updates the example surface cannot
    /// express (field clears, OR IGNORE appends).
    pub fn execute<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<usize, StoreError> {
        Ok(self.tx.execute(sql, params)?)
    }

    pub fn commit(self) -> Result<(), StoreError> {
        self.tx.commit()?;
        Ok(())
    }

    /// Roll back the scope. A rollback failure leaves nothing for the caller
    /// to do beyond what the original error already reports, so it is logged
    /// and dropped.
    pub fn rollback(self) {
        if let Err(e) = self.tx.rollback() {
            tracing::debug!(error = %e, "transaction rollback failed");
        }
    }
}

/// Join descriptor for a collection related to a parent entity.
#[derive(Debug, Clone, Copy)]
pub struct Related {
    /// Table holding the related rows.
    pub table: &'static str,
    /// Column in the related table referencing the parent's key.
    pub parent_key: &'static str,
}

/// Short-lived read session supporting compound example queries across a
/// parent entity and one related collection. Matching is exact; parent rows
/// are deduplicated so several matching related rows count as one parent.
pub struct ReadSession<'a> {
    conn: &'a Connection,
}

impl<'a> ReadSession<'a> {
    pub(super) fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parent rows satisfying `parent` whose related collection contains at
    /// least one row satisfying `related`.
    pub fn query_with_related<E: Entity>(
        &self,
        parent: &Example,
        related: Related,
        related_example: &Example,
    ) -> Result<Vec<E>, StoreError> {
        let (parent_clause, parent_values) = parent.where_clause(Some("p"), 1);
        let (related_clause, related_values) =
            related_example.where_clause(Some("r"), 1 + parent_values.len());
        let columns: Vec<String> = E::COLUMNS.iter().map(|c| format!("p.{c}")).collect();
        let sql = format!(
            "SELECT DISTINCT {} FROM {} p JOIN {} r ON r.{} = p.{} WHERE {} AND {}",
            columns.join(", "),
            E::TABLE,
            related.table,
            related.parent_key,
            E::KEY,
            parent_clause,
            related_clause
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let values = parent_values.into_iter().chain(related_values);
        let rows = stmt.query_map(params_from_iter(values), E::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
