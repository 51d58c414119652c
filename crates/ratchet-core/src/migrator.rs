use ratchet_common::{Error, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{Backend, Executor};
use crate::migration::{Migration, MigrationList};
use crate::plan::{Direction, Plan};
use crate::target::{check_bounds, resolve_target};

/// A failed run, carrying the migrations that completed before it stopped.
///
/// On `StatementExecutionFailed` the failing step is not in `applied` and the
/// stored version is that of the last entry. On `VersionPersistenceFailed`
/// the failing step did run and is the last entry of `applied`, but the
/// stored version still reflects the step before it.
#[derive(Debug, thiserror::Error)]
#[error("migration run stopped after {} applied step(s)", applied.len())]
pub struct MigrateError {
    pub applied: Vec<Migration>,
    #[source]
    pub source: Error,
}

impl From<Error> for MigrateError {
    fn from(source: Error) -> Self {
        Self {
            applied: Vec::new(),
            source,
        }
    }
}

/// Snapshot of where the database stands relative to the requested target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Status {
    pub current: u32,
    pub target: u32,
    pub latest: u32,
    pub direction: Direction,
    pub pending: usize,
}

/// Moves a database between versions of a [`MigrationList`].
pub struct Migrator<B> {
    backend: B,
    migrations: MigrationList,
    target: u32,
}

impl<B: Backend> Migrator<B> {
    /// Validate `target` against the list, then make sure the version table
    /// exists. Nothing touches the database if the target is out of range.
    pub fn new(mut backend: B, migrations: MigrationList, target: u32) -> Result<Self> {
        let target = check_bounds(target, migrations.len())?;
        backend.initialize()?;
        debug!(
            dialect = backend.dialect(),
            migrations = migrations.len(),
            target,
            "migrator ready"
        );
        Ok(Self {
            backend,
            migrations,
            target,
        })
    }

    /// Like [`Migrator::new`], resolving the target from its textual form.
    pub fn from_spec(backend: B, migrations: MigrationList, spec: Option<&str>) -> Result<Self> {
        let target = resolve_target(spec, migrations.len())?;
        Self::new(backend, migrations, target)
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn set_target(&mut self, target: u32) -> Result<()> {
        self.target = check_bounds(target, self.migrations.len())?;
        Ok(())
    }

    pub fn migrations(&self) -> &MigrationList {
        &self.migrations
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// The stored version.
    pub fn version(&mut self) -> Result<u32> {
        self.backend.read_version()
    }

    pub fn status(&mut self) -> Result<Status> {
        let current = self.version()?;
        let plan = self.migrations.select(current, self.target)?;
        Ok(Status {
            current,
            target: self.target,
            latest: self.migrations.latest(),
            direction: plan.direction,
            pending: plan.steps.len(),
        })
    }

    /// What [`Migrator::migrate`] would run, without running it.
    pub fn plan(&mut self) -> Result<Plan> {
        let current = self.version()?;
        let plan = self.migrations.select(current, self.target)?;
        plan.ensure_reversible()?;
        Ok(plan)
    }

    /// Run every selected migration in order, recording the stored version
    /// after each one. Returns the migrations run, empty when already at the
    /// target. Stops at the first failure without retrying or rolling back.
    pub fn migrate(&mut self) -> std::result::Result<Vec<Migration>, MigrateError> {
        let plan = self.plan()?;
        if plan.is_empty() {
            info!(version = plan.from, "database already at target version");
            return Ok(Vec::new());
        }

        info!(
            dialect = self.backend.dialect(),
            from = plan.from,
            to = plan.to,
            direction = %plan.direction,
            steps = plan.steps.len(),
            "migrating"
        );

        let direction = plan.direction;
        let mut applied = Vec::with_capacity(plan.steps.len());
        for migration in plan.steps {
            let version = migration.version();
            let statement = migration.statement(direction);
            debug!(version, %direction, sql = statement, "executing migration");

            if let Err(e) = self.backend.execute(statement) {
                warn!(version, %direction, "migration failed: {e}");
                return Err(MigrateError {
                    applied,
                    source: Error::StatementExecutionFailed {
                        version,
                        detail: detail(e),
                    },
                });
            }

            let recorded = direction.version_after(&migration);
            if let Err(e) = self.backend.write_version(recorded) {
                // The statement ran but the stored version does not say so.
                warn!(
                    version,
                    recorded, "migration applied but version not recorded: {e}"
                );
                applied.push(migration);
                return Err(MigrateError {
                    applied,
                    source: Error::VersionPersistenceFailed {
                        version: recorded,
                        detail: detail(e),
                    },
                });
            }

            info!(
                version,
                %direction,
                comment = %migration.comment,
                "applied migration"
            );
            applied.push(migration);
        }

        info!(version = self.target, "migration complete");
        Ok(applied)
    }
}

fn detail(e: Error) -> String {
    match e {
        Error::Database(detail) => detail,
        other => other.to_string(),
    }
}
