use std::path::Path;

use ratchet_common::{Error, Result};
use ratchet_core::{Backend, Executor};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

use crate::DEFAULT_VERSION_TABLE;
use crate::ident::validate_identifier;

/// Version tracking for an embedded SQLite database.
///
/// Table presence is detected through `sqlite_master`.
pub struct SqliteBackend {
    conn: Connection,
    table: String,
}

impl SqliteBackend {
    pub fn open(db_path: &Path) -> Result<Self> {
        info!("opening sqlite database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self::new(conn))
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self::new(conn))
    }

    /// Wrap an existing connection, tracking versions in the default table.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            table: DEFAULT_VERSION_TABLE.to_string(),
        }
    }

    /// Track versions in `table` instead of the default.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        validate_identifier("table", table)?;
        self.table = table.to_string();
        Ok(self)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_inner(self) -> Connection {
        self.conn
    }
}

impl Executor for SqliteBackend {
    fn execute(&mut self, statement: &str) -> Result<()> {
        self.conn
            .execute_batch(statement)
            .map_err(|e| Error::Database(e.to_string()))
    }
}

impl Backend for SqliteBackend {
    fn dialect(&self) -> &'static str {
        "sqlite"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.is_initialized()? {
            return Ok(());
        }
        info!("creating version table {}", self.table);
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        tx.execute(
            &format!("CREATE TABLE {} (version INTEGER NOT NULL) STRICT", self.table),
            [],
        )
        .map_err(|e| Error::Database(format!("failed to create version table: {e}")))?;
        tx.execute(
            &format!("INSERT INTO {} (version) VALUES (0)", self.table),
            [],
        )
        .map_err(|e| Error::Database(format!("failed to seed version table: {e}")))?;
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit version table: {e}")))
    }

    fn is_initialized(&mut self) -> Result<bool> {
        let name: Option<String> = self
            .conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![self.table],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to query sqlite_master: {e}")))?;
        Ok(name.is_some())
    }

    fn read_version(&mut self) -> Result<u32> {
        if !self.is_initialized()? {
            return Err(Error::NotInitialized);
        }
        let version: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT version FROM {} LIMIT 1", self.table),
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| Error::Database(format!("failed to read version: {e}")))?;

        let version = version.unwrap_or(0);
        u32::try_from(version)
            .map_err(|_| Error::Database(format!("stored version {version} is not valid")))
    }

    fn write_version(&mut self, version: u32) -> Result<()> {
        debug!(version, table = %self.table, "setting version");
        let updated = self
            .conn
            .execute(
                &format!("UPDATE {} SET version = ?1", self.table),
                params![version],
            )
            .map_err(|e| Error::Database(format!("failed to update version: {e}")))?;

        if updated == 0 {
            self.conn
                .execute(
                    &format!("INSERT INTO {} (version) VALUES (?1)", self.table),
                    params![version],
                )
                .map_err(|e| Error::Database(format!("failed to insert version: {e}")))?;
        }
        Ok(())
    }
}
