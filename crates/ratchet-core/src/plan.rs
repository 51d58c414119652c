use std::fmt;

use ratchet_common::{Error, Result};
use serde::Serialize;

use crate::migration::{Migration, MigrationList};
use crate::target::check_bounds;

/// Which way a run moves relative to the stored version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

impl Direction {
    pub fn between(current: u32, target: u32) -> Self {
        match target.cmp(&current) {
            std::cmp::Ordering::Greater => Direction::Up,
            std::cmp::Ordering::Less => Direction::Down,
            std::cmp::Ordering::Equal => Direction::None,
        }
    }

    /// Stored version once `migration` has run in this direction.
    pub fn version_after(self, migration: &Migration) -> u32 {
        match self {
            Direction::Up => migration.version(),
            Direction::Down => migration.version().saturating_sub(1),
            Direction::None => migration.version(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::None => "none",
        };
        f.write_str(s)
    }
}

/// The exact steps a run from `from` to `to` executes, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub from: u32,
    pub to: u32,
    pub direction: Direction,
    pub steps: Vec<Migration>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Fail with `IrreversibleMigration` if a down plan would run an empty
    /// `down` statement. Checked over the whole plan before anything runs.
    pub fn ensure_reversible(&self) -> Result<()> {
        if self.direction != Direction::Down {
            return Ok(());
        }
        match self.steps.iter().find(|m| !m.is_reversible()) {
            Some(m) => Err(Error::IrreversibleMigration {
                version: m.version(),
            }),
            None => Ok(()),
        }
    }
}

impl MigrationList {
    /// Select the migrations that move the stored version from `current` to
    /// `target`.
    ///
    /// Up runs versions `(current, target]` ascending. Down runs versions
    /// `(target, current]` descending, so the most recently applied step is
    /// undone first.
    pub fn select(&self, current: u32, target: u32) -> Result<Plan> {
        let available = self.len();
        if current as usize > available {
            return Err(Error::StoredVersionAhead {
                stored: current,
                available,
            });
        }
        check_bounds(target, available)?;

        let direction = Direction::between(current, target);
        let migrations = self.as_slice();
        let steps = match direction {
            Direction::Up => migrations[current as usize..target as usize].to_vec(),
            Direction::Down => migrations[target as usize..current as usize]
                .iter()
                .rev()
                .cloned()
                .collect(),
            Direction::None => Vec::new(),
        };

        Ok(Plan {
            from: current,
            to: target,
            direction,
            steps,
        })
    }
}
