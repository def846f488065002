// Signet — Database Management
//
// Opens and initializes the directory database. Schema-level UNIQUE
// constraints on principal names and query ids are the sole arbiter for
// concurrent create races: the losing writer observes a constraint violation,
// never a silent overwrite.

use rusqlite::Connection;

use super::adapter::{ReadSession, TxScope};
use super::StoreError;

/// Wrapper around a SQLite connection holding the directory schema.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the directory database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database, used by tests and embedded consumers.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open a transaction scope. The scope rolls back on drop unless
    /// committed, so every exit path releases it.
    pub fn scope(&self) -> Result<TxScope<'_>, StoreError> {
        TxScope::begin(&self.conn)
    }

    /// Run `f` inside one transaction scope: commit on `Ok`, roll back on
    /// `Err`. The scope never outlives this call.
    pub fn with_scope<T>(
        &self,
        f: impl FnOnce(&TxScope<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let scope = self.scope()?;
        match f(&scope) {
            Ok(value) => {
                scope.commit()?;
                Ok(value)
            }
            Err(e) => {
                scope.rollback();
                Err(e)
            }
        }
    }

    /// Open a short-lived read session for compound example queries.
    pub fn read_session(&self) -> ReadSession<'_> {
        ReadSession::new(&self.conn)
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                name             TEXT PRIMARY KEY,
                query_id         TEXT NOT NULL UNIQUE,
                secret_key       TEXT NOT NULL,
                password         TEXT NOT NULL,
                token            TEXT NOT NULL,
                is_administrator INTEGER NOT NULL DEFAULT 0,
                is_enabled       INTEGER NOT NULL DEFAULT 1,
                certificate      TEXT,
                created_at       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS historical_certificates (
                user_name        TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
                certificate      TEXT NOT NULL,
                recorded_at      TEXT NOT NULL,
                PRIMARY KEY (user_name, certificate)
            );

            CREATE TABLE IF NOT EXISTS groups (
                name             TEXT PRIMARY KEY,
                created_at       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS group_members (
                group_name       TEXT NOT NULL REFERENCES groups(name) ON DELETE CASCADE,
                user_name        TEXT NOT NULL REFERENCES users(name) ON DELETE CASCADE,
                PRIMARY KEY (group_name, user_name)
            );

            CREATE TABLE IF NOT EXISTS confirmations (
                user_name        TEXT PRIMARY KEY,
                code             TEXT NOT NULL,
                created_at       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_historical_certificate
                ON historical_certificates(certificate);

            CREATE INDEX IF NOT EXISTS idx_users_certificate
                ON users(certificate);
            ",
        )?;

        tracing::debug!("database migrations completed");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
