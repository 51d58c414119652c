use std::path::Path;

use ratchet_common::{Error, Result};
use ratchet_config::{DatabaseConfig, Driver, ENV_DATABASE_URL};
use ratchet_core::Backend;
use ratchet_db::{DEFAULT_VERSION_TABLE, PostgresBackend, SqliteBackend};

/// Open the configured database and wrap it in its dialect's backend.
pub fn open_backend(database: &DatabaseConfig) -> Result<Box<dyn Backend>> {
    let url = database.url.as_deref().ok_or_else(|| {
        Error::Config(format!(
            "no database configured; set {ENV_DATABASE_URL} or pass --database-url"
        ))
    })?;
    let table = database
        .version_table
        .as_deref()
        .unwrap_or(DEFAULT_VERSION_TABLE);

    match database.driver {
        Driver::Sqlite => {
            let backend = SqliteBackend::open(Path::new(sqlite_path(url)))?.with_table(table)?;
            Ok(Box::new(backend))
        }
        Driver::Postgres => {
            let backend =
                PostgresBackend::connect(url, database.schema.as_deref())?.with_table(table)?;
            Ok(Box::new(backend))
        }
    }
}

/// Accept `sqlite://app.db` and `sqlite:app.db` as well as a bare path.
fn sqlite_path(url: &str) -> &str {
    url.strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url)
}

/// Hide the password in a connection string before printing it.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let Some((credentials, host)) = rest.rsplit_once('@') else {
        return url.to_string();
    };
    match credentials.split_once(':') {
        Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
        None => url.to_string(),
    }
}
