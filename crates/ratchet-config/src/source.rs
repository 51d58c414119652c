use std::io::ErrorKind;
use std::path::Path;

use ratchet_common::{Error, Result};
use ratchet_core::{Migration, MigrationList};
use serde::Deserialize;
use tracing::info;

use crate::ENV_FILE;

/// The migration YAML document:
///
/// ```yaml
/// migrations:
///   - comment: create users
///     up: CREATE TABLE users (id INTEGER PRIMARY KEY)
///     down: DROP TABLE users
/// ```
///
/// Entries carry no version; each one is numbered by its position.
#[derive(Debug, Default, Deserialize)]
pub struct MigrationFile {
    #[serde(default)]
    pub migrations: Vec<Migration>,
}

impl MigrationFile {
    pub fn load(path: &Path) -> Result<MigrationList> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::SourceMissing(path.display().to_string()),
            _ => Error::LoadFailed(format!("failed to read {}: {e}", path.display())),
        })?;
        let list = Self::parse(&content)?;
        info!("loaded {} migrations from {}", list.len(), path.display());
        Ok(list)
    }

    /// Load the file named by `RATCHET_FILE`, looked up through `env`.
    pub fn from_env<F>(env: F) -> Result<MigrationList>
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = env(ENV_FILE)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                Error::SourceMissing(format!("environment variable {ENV_FILE} is not set"))
            })?;
        Self::load(Path::new(&path))
    }

    pub fn parse(content: &str) -> Result<MigrationList> {
        let file: MigrationFile =
            serde_yaml::from_str(content).map_err(|e| Error::LoadFailed(e.to_string()))?;
        MigrationList::new(file.migrations)
    }
}
