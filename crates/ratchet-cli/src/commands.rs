use std::io::Write;

use anyhow::{Context, Result};
use ratchet_common::Error;
use ratchet_config::{AppConfig, ENV_FILE, MigrationFile};
use ratchet_core::{Backend, Direction, Migration, MigrationList, Migrator, Plan, resolve_target};
use tracing::warn;

use crate::banner;
use crate::connect::open_backend;

fn load_migrations(config: &AppConfig) -> ratchet_common::Result<MigrationList> {
    let path = config.migrations.file.as_deref().ok_or_else(|| {
        Error::SourceMissing(format!(
            "no migration file configured; set {ENV_FILE} or pass --file"
        ))
    })?;
    MigrationFile::load(path)
}

/// Load the migration list and resolve the target before connecting, so a bad
/// file or target never reaches the database.
fn open_migrator(config: &AppConfig) -> Result<Migrator<Box<dyn Backend>>> {
    let migrations = load_migrations(config)?;
    let target = resolve_target(config.target.as_deref(), migrations.len())?;
    let backend = open_backend(&config.database).context("failed to open database")?;
    Ok(Migrator::new(backend, migrations, target)?)
}

fn describe(migration: &Migration, direction: Direction) -> String {
    if migration.comment.is_empty() {
        format!("v{} {direction}", migration.version())
    } else {
        format!("v{} {direction}: {}", migration.version(), migration.comment)
    }
}

fn write_plan(out: &mut dyn Write, plan: &Plan) -> Result<()> {
    if plan.is_empty() {
        writeln!(out, "nothing to do, already at version {}", plan.from)?;
        return Ok(());
    }
    writeln!(
        out,
        "{} step(s) {} from version {} to {}:",
        plan.steps.len(),
        plan.direction,
        plan.from,
        plan.to
    )?;
    for migration in &plan.steps {
        writeln!(out, "  {}", describe(migration, plan.direction))?;
    }
    Ok(())
}

pub fn migrate(config: &AppConfig, dry_run: bool, out: &mut dyn Write) -> Result<()> {
    let mut migrator = open_migrator(config)?;
    let plan = migrator.plan()?;
    if dry_run || plan.is_empty() {
        return write_plan(out, &plan);
    }

    match migrator.migrate() {
        Ok(applied) => {
            for migration in &applied {
                writeln!(out, "{}", describe(migration, plan.direction))?;
            }
            writeln!(out, "now at version {}", migrator.target())?;
            Ok(())
        }
        Err(err) => {
            for migration in &err.applied {
                writeln!(out, "{}", describe(migration, plan.direction))?;
            }
            if matches!(err.source, Error::VersionPersistenceFailed { .. }) {
                warn!("last migration ran but its version was not recorded; check the schema");
            }
            let applied = err.applied.len();
            Err(anyhow::Error::new(err.source)
                .context(format!("migration stopped after {applied} applied step(s)")))
        }
    }
}

pub fn version(config: &AppConfig, out: &mut dyn Write) -> Result<()> {
    let mut backend = open_backend(&config.database).context("failed to open database")?;
    if !backend.is_initialized()? {
        writeln!(out, "0 (version table not initialized)")?;
        return Ok(());
    }
    writeln!(out, "{}", backend.read_version()?)?;
    Ok(())
}

pub fn status(config: &AppConfig, json: bool, out: &mut dyn Write) -> Result<()> {
    let mut migrator = open_migrator(config)?;
    let status = migrator.status()?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &status)?;
        writeln!(out)?;
    } else {
        banner::write_status(out, &status, config)?;
    }
    Ok(())
}

pub fn plan(config: &AppConfig, json: bool, out: &mut dyn Write) -> Result<()> {
    let mut migrator = open_migrator(config)?;
    let plan = migrator.plan()?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &plan)?;
        writeln!(out)?;
        return Ok(());
    }
    write_plan(out, &plan)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const MIGRATIONS: &str = "migrations:
  - comment: create users
    up: CREATE TABLE users (id INTEGER PRIMARY KEY)
    down: DROP TABLE users
  - comment: create posts
    up: CREATE TABLE posts (id INTEGER PRIMARY KEY)
    down: DROP TABLE posts
  - comment: broken
    up: CREATE TABLE users (id INTEGER PRIMARY KEY)
    down: SELECT 1
";

    fn setup(dir: &Path, target: &str) -> AppConfig {
        let file = dir.join("migrations.yml");
        std::fs::write(&file, MIGRATIONS).unwrap();

        let mut config = AppConfig::default();
        config.migrations.file = Some(file);
        config.database.url = Some(dir.join("app.db").display().to_string());
        config.target = Some(target.to_string());
        config
    }

    fn run<F>(f: F) -> (Result<()>, String)
    where
        F: FnOnce(&mut dyn Write) -> Result<()>,
    {
        let mut buf = Vec::new();
        let result = f(&mut buf);
        (result, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn migrate_reports_applied_steps() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "2");

        let (result, output) = run(|out| migrate(&config, false, out));
        result.unwrap();
        assert_eq!(
            output,
            "v1 up: create users\nv2 up: create posts\nnow at version 2\n"
        );

        let (result, output) = run(|out| version(&config, out));
        result.unwrap();
        assert_eq!(output, "2\n");
    }

    #[test]
    fn dry_run_leaves_database_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "2");

        let (result, output) = run(|out| migrate(&config, true, out));
        result.unwrap();
        assert!(output.starts_with("2 step(s) up from version 0 to 2:"));

        let (_, output) = run(|out| version(&config, out));
        assert_eq!(output, "0\n");
    }

    #[test]
    fn failed_run_prints_prefix_and_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "3");

        let (result, output) = run(|out| migrate(&config, false, out));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("after 2 applied step(s)"));
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::StatementExecutionFailed { version: 3, .. })
        ));
        assert_eq!(output, "v1 up: create users\nv2 up: create posts\n");

        let (_, output) = run(|out| version(&config, out));
        assert_eq!(output, "2\n");
    }

    #[test]
    fn bad_target_fails_before_creating_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "9");

        let (result, _) = run(|out| migrate(&config, false, out));
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::TargetOutOfBounds { .. })
        ));
        assert!(!dir.path().join("app.db").exists());
    }

    #[test]
    fn missing_migration_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path(), "1");
        config.migrations.file = None;

        let (result, _) = run(|out| migrate(&config, false, out));
        assert!(matches!(
            result.unwrap_err().downcast_ref::<Error>(),
            Some(Error::SourceMissing(_))
        ));
    }

    #[test]
    fn status_json_has_versions() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "1");

        let (result, output) = run(|out| status(&config, true, out));
        result.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["current"], 0);
        assert_eq!(value["target"], 1);
        assert_eq!(value["latest"], 3);
        assert_eq!(value["direction"], "up");
        assert_eq!(value["pending"], 1);
    }

    #[test]
    fn plan_lists_down_steps_descending() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = setup(dir.path(), "2");
        run(|out| migrate(&config, false, out)).0.unwrap();

        config.target = Some("0".into());
        let (result, output) = run(|out| plan(&config, false, out));
        result.unwrap();
        assert_eq!(
            output,
            "2 step(s) down from version 2 to 0:\n  v2 down: create posts\n  v1 down: create users\n"
        );
    }

    #[test]
    fn version_on_fresh_database_reports_uninitialized() {
        let dir = tempfile::tempdir().unwrap();
        let config = setup(dir.path(), "0");

        let (result, output) = run(|out| version(&config, out));
        result.unwrap();
        assert_eq!(output, "0 (version table not initialized)\n");
    }
}
