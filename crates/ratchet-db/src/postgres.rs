use ::postgres::{Client, NoTls};
use ratchet_common::{Error, Result};
use ratchet_core::{Backend, Executor};
use tracing::{debug, info};

use crate::DEFAULT_VERSION_TABLE;
use crate::ident::validate_identifier;

/// Schema used when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Version tracking for a PostgreSQL database.
///
/// The tracking table lives in a single schema and its presence is detected
/// through `information_schema.tables` scoped to that schema.
pub struct PostgresBackend {
    client: Client,
    schema: String,
    table: String,
}

impl PostgresBackend {
    /// Connect with a libpq-style connection string.
    pub fn connect(url: &str, schema: Option<&str>) -> Result<Self> {
        info!("connecting to postgres");
        let client = Client::connect(url, NoTls)
            .map_err(|e| Error::Database(format!("failed to connect: {e}")))?;
        Self::new(client, schema)
    }

    /// Wrap an existing client. An empty or absent schema means `public`.
    pub fn new(client: Client, schema: Option<&str>) -> Result<Self> {
        let schema = match schema {
            Some(s) if !s.trim().is_empty() => s.trim(),
            _ => DEFAULT_SCHEMA,
        };
        validate_identifier("schema", schema)?;
        Ok(Self {
            client,
            schema: schema.to_string(),
            table: DEFAULT_VERSION_TABLE.to_string(),
        })
    }

    /// Track versions in `table` instead of the default.
    pub fn with_table(mut self, table: &str) -> Result<Self> {
        validate_identifier("table", table)?;
        self.table = table.to_string();
        Ok(self)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn client(&mut self) -> &mut Client {
        &mut self.client
    }

    pub fn into_inner(self) -> Client {
        self.client
    }

    /// Quoted so the catalog holds the names exactly as configured.
    fn qualified_table(&self) -> String {
        format!("\"{}\".\"{}\"", self.schema, self.table)
    }
}

impl Executor for PostgresBackend {
    fn execute(&mut self, statement: &str) -> Result<()> {
        self.client
            .batch_execute(statement)
            .map_err(|e| Error::Database(e.to_string()))
    }
}

impl Backend for PostgresBackend {
    fn dialect(&self) -> &'static str {
        "postgres"
    }

    fn initialize(&mut self) -> Result<()> {
        if self.is_initialized()? {
            return Ok(());
        }
        let table = self.qualified_table();
        info!("creating version table {table}");
        let mut tx = self
            .client
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;
        tx.batch_execute(&format!("CREATE TABLE {table} (version INTEGER NOT NULL)"))
            .map_err(|e| Error::Database(format!("failed to create version table: {e}")))?;
        tx.batch_execute(&format!("INSERT INTO {table} (version) VALUES (0)"))
            .map_err(|e| Error::Database(format!("failed to seed version table: {e}")))?;
        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit version table: {e}")))
    }

    fn is_initialized(&mut self) -> Result<bool> {
        let row = self
            .client
            .query_opt(
                "SELECT table_name::text FROM information_schema.tables \
                 WHERE table_schema = $1 AND table_name = $2",
                &[&self.schema, &self.table],
            )
            .map_err(|e| Error::Database(format!("failed to query information_schema: {e}")))?;
        Ok(row.is_some())
    }

    fn read_version(&mut self) -> Result<u32> {
        if !self.is_initialized()? {
            return Err(Error::NotInitialized);
        }
        let table = self.qualified_table();
        let row = self
            .client
            .query_opt(format!("SELECT version FROM {table} LIMIT 1").as_str(), &[])
            .map_err(|e| Error::Database(format!("failed to read version: {e}")))?;

        let version: i32 = match row {
            Some(row) => row
                .try_get(0)
                .map_err(|e| Error::Database(format!("failed to decode version: {e}")))?,
            None => 0,
        };
        u32::try_from(version)
            .map_err(|_| Error::Database(format!("stored version {version} is not valid")))
    }

    fn write_version(&mut self, version: u32) -> Result<()> {
        let table = self.qualified_table();
        debug!(version, %table, "setting version");
        let value = i32::try_from(version)
            .map_err(|_| Error::Database(format!("version {version} exceeds INTEGER range")))?;

        let updated = self
            .client
            .execute(format!("UPDATE {table} SET version = $1").as_str(), &[&value])
            .map_err(|e| Error::Database(format!("failed to update version: {e}")))?;

        if updated == 0 {
            self.client
                .execute(
                    format!("INSERT INTO {table} (version) VALUES ($1)").as_str(),
                    &[&value],
                )
                .map_err(|e| Error::Database(format!("failed to insert version: {e}")))?;
        }
        Ok(())
    }
}
