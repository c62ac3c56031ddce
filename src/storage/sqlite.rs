//! SQLite storage implementation

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use rusqlite::{Connection, OptionalExtension, Params, Row};
use serde::Serialize;
use crate::Result;
use super::schema;

/// Shared handle to the single SQLite connection.
///
/// Cloning shares the connection; statements run serially under its lock.
/// Each statement runs in its own implicit transaction.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    journal: Option<Arc<Mutex<Vec<String>>>>,
}

impl Store {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        tracing::debug!("Opened store at {}", path.display());
        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            journal: None,
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Record the SQL of every write statement issued through this handle
    /// and its clones from now on.
    pub fn with_statement_journal(mut self) -> Self {
        self.journal = Some(Arc::new(Mutex::new(Vec::new())));
        self
    }

    /// Write statements recorded so far, oldest first
    pub fn journal(&self) -> Vec<String> {
        self.journal
            .as_ref()
            .map(|j| j.lock().unwrap_or_else(PoisonError::into_inner).clone())
            .unwrap_or_default()
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        let conn = self.connection();
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Lock the connection for direct use
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, sql: &str) {
        tracing::debug!(sql = sql.trim(), "Executing statement");
        if let Some(journal) = &self.journal {
            journal
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(sql.trim().to_string());
        }
    }

    // ========== Statement Execution ==========

    /// Run a write statement, returning the number of affected rows
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<usize> {
        let conn = self.connection();
        self.record(sql);
        conn.execute(sql, params)
    }

    /// Run an INSERT and return the row id the store assigned
    pub fn insert<P: Params>(&self, sql: &str, params: P) -> rusqlite::Result<i64> {
        let conn = self.connection();
        self.record(sql);
        conn.execute(sql, params)?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch every matching row, in storage order
    pub fn query_all<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let conn = self.connection();
        let mut stmt = conn.prepare(sql)?;
        let rows: rusqlite::Result<Vec<T>> = stmt.query_map(params, f)?.collect();
        rows
    }

    /// Fetch at most one row
    pub fn query_one<T, P, F>(&self, sql: &str, params: P, f: F) -> rusqlite::Result<Option<T>>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        self.connection().query_row(sql, params, f).optional()
    }

    // ========== Maintenance ==========

    /// Count rows of one table
    pub fn count(&self, table: &str) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = self.connection().query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<DbStats> {
        Ok(DbStats {
            games: self.count("games")?,
            categories: self.count("categories")?,
            game_links: self.count("games_categories")?,
            category_links: self.count("categories_dependence")?,
        })
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("journal", &self.journal.is_some())
            .finish_non_exhaustive()
    }
}

/// Database statistics
#[derive(Debug, Clone, Serialize)]
pub struct DbStats {
    pub games: usize,
    pub categories: usize,
    pub game_links: usize,
    pub category_links: usize,
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Games: {}", self.games)?;
        writeln!(f, "  Categories: {}", self.categories)?;
        writeln!(f, "  Game/category links: {}", self.game_links)?;
        writeln!(f, "  Category dependences: {}", self.category_links)
    }
}
