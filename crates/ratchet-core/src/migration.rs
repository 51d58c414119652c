use ratchet_common::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::plan::Direction;

/// One schema change step.
///
/// The version is never read from the definition. It is assigned from the
/// step's position when the owning [`MigrationList`] is built, so reordering
/// the source renumbers every step after the move.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub up: String,
    #[serde(default)]
    pub down: String,
    #[serde(skip_deserializing)]
    version: u32,
}

impl Migration {
    pub fn new(comment: impl Into<String>, up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            up: up.into(),
            down: down.into(),
            version: 0,
        }
    }

    /// 1-based position in the owning list, or 0 before enumeration.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The statement to run when moving in `direction`.
    pub fn statement(&self, direction: Direction) -> &str {
        match direction {
            Direction::Up => &self.up,
            Direction::Down => &self.down,
            Direction::None => "",
        }
    }

    /// A step with an empty `down` cannot be reverted.
    pub fn is_reversible(&self) -> bool {
        !self.down.trim().is_empty()
    }
}

/// Ordered, immutable sequence of migrations. Version N is the N-th entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationList {
    migrations: Vec<Migration>,
}

impl MigrationList {
    /// Number the migrations by position and validate them.
    pub fn new(mut migrations: Vec<Migration>) -> Result<Self> {
        for (index, migration) in migrations.iter_mut().enumerate() {
            let version = u32::try_from(index + 1)
                .map_err(|_| Error::LoadFailed("too many migrations".into()))?;
            migration.version = version;
            if migration.up.trim().is_empty() {
                return Err(Error::InvalidMigration {
                    version,
                    reason: "\"up\" statement is missing or empty".into(),
                });
            }
        }
        Ok(Self { migrations })
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Highest version in the list; 0 when empty.
    pub fn latest(&self) -> u32 {
        self.migrations.last().map(Migration::version).unwrap_or(0)
    }

    pub fn get(&self, version: u32) -> Option<&Migration> {
        let index = usize::try_from(version).ok()?.checked_sub(1)?;
        self.migrations.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Migration> {
        self.migrations.iter()
    }

    pub(crate) fn as_slice(&self) -> &[Migration] {
        &self.migrations
    }
}

impl<'a> IntoIterator for &'a MigrationList {
    type Item = &'a Migration;
    type IntoIter = std::slice::Iter<'a, Migration>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
