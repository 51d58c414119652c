use std::path::{Path, PathBuf};

use ratchet_common::{Error, Result};
use tracing::{debug, info};

use crate::model::AppConfig;
use crate::{ENV_DATABASE_DRIVER, ENV_DATABASE_URL, ENV_FILE, ENV_SCHEMA, ENV_TARGET};

const CONFIG_FILE_NAMES: [&str; 3] = ["config.yml", "config.yaml", "config.toml"];

/// Loads [`AppConfig`] from a file, then layers `RATCHET_*` environment
/// variables on top.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Look in the default config directory (`<config_dir>/ratchet`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Read exactly this file; a missing file is an error.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn default_config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ratchet"))
    }

    pub fn load(&self) -> Result<AppConfig> {
        self.load_with_env(|key| std::env::var(key).ok())
    }

    /// Like [`ConfigLoader::load`] with environment lookups routed through `env`.
    pub fn load_with_env<F>(&self, env: F) -> Result<AppConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.resolve_path() {
            Some(path) => Self::read_file(&path)?,
            None => {
                debug!("no config file found, using defaults");
                AppConfig::default()
            }
        };
        apply_env_overrides(&mut config, env)?;
        Ok(config)
    }

    fn resolve_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        let dir = Self::default_config_dir()?;
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Parse a config file, choosing TOML or YAML by extension.
    pub fn read_file(path: &Path) -> Result<AppConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        info!("loaded config from {}", path.display());

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            toml::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid TOML in {}: {e}", path.display())))
        } else {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::Config(format!("invalid YAML in {}: {e}", path.display())))
        }
    }
}

/// Overwrite config values with any `RATCHET_*` variables `env` knows about.
/// Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|value| !value.trim().is_empty());

    if let Some(file) = lookup(ENV_FILE) {
        config.migrations.file = Some(PathBuf::from(file));
    }
    if let Some(target) = lookup(ENV_TARGET) {
        config.target = Some(target);
    }
    if let Some(url) = lookup(ENV_DATABASE_URL) {
        config.database.url = Some(url);
    }
    if let Some(driver) = lookup(ENV_DATABASE_DRIVER) {
        config.database.driver = driver.parse()?;
    }
    if let Some(schema) = lookup(ENV_SCHEMA) {
        config.database.schema = Some(schema);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::model::Driver;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "database:\n  driver: sqlite\n  url: app.db\nmigrations:\n  file: migrations.yml\ntarget: 2\n",
        )
        .unwrap();

        let config = ConfigLoader::with_path(&path)
            .load_with_env(env_from(&[]))
            .unwrap();
        assert_eq!(config.database.url.as_deref(), Some("app.db"));
        assert_eq!(
            config.migrations.file.as_deref(),
            Some(Path::new("migrations.yml"))
        );
        assert_eq!(config.target.as_deref(), Some("2"));
    }

    #[test]
    fn reads_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "target = \"1\"\n\n[database]\ndriver = \"postgres\"\nschema = \"app\"\n",
        )
        .unwrap();

        let config = ConfigLoader::read_file(&path).unwrap();
        assert_eq!(config.database.driver, Driver::Postgres);
        assert_eq!(config.database.schema.as_deref(), Some("app"));
        assert_eq!(config.target.as_deref(), Some("1"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result =
            ConfigLoader::with_path(dir.path().join("nope.yml")).load_with_env(env_from(&[]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "database: [unclosed").unwrap();
        assert!(matches!(
            ConfigLoader::read_file(&path),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "target: 1\ndatabase:\n  url: file.db\n").unwrap();

        let config = ConfigLoader::with_path(&path)
            .load_with_env(env_from(&[
                (ENV_TARGET, "3"),
                (ENV_FILE, "/srv/migrations.yml"),
                (ENV_DATABASE_DRIVER, "postgres"),
                (ENV_DATABASE_URL, "postgres://localhost/app"),
                (ENV_SCHEMA, "tenant"),
            ]))
            .unwrap();

        assert_eq!(config.target.as_deref(), Some("3"));
        assert_eq!(
            config.migrations.file.as_deref(),
            Some(Path::new("/srv/migrations.yml"))
        );
        assert_eq!(config.database.driver, Driver::Postgres);
        assert_eq!(
            config.database.url.as_deref(),
            Some("postgres://localhost/app")
        );
        assert_eq!(config.database.schema.as_deref(), Some("tenant"));
    }

    #[test]
    fn empty_environment_values_are_ignored() {
        let mut config = AppConfig {
            target: Some("2".into()),
            ..Default::default()
        };
        apply_env_overrides(&mut config, env_from(&[(ENV_TARGET, "  ")])).unwrap();
        assert_eq!(config.target.as_deref(), Some("2"));
    }

    #[test]
    fn unknown_driver_in_environment_is_rejected() {
        let mut config = AppConfig::default();
        let result =
            apply_env_overrides(&mut config, env_from(&[(ENV_DATABASE_DRIVER, "oracle")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
